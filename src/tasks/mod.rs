//! Background tasks module
//! 
//! This module contains the tick source and the timer it drives.

pub mod pomodoro;
pub mod tick_source;

// Re-export main types
pub use pomodoro::{ActiveTimer, TimerSnapshot};
pub use tick_source::TickSource;
