//! FocusFlow - A study-session tracker server with a Pomodoro timer
//! 
//! This library provides the Pomodoro timer state machine, the tick source
//! that drives it, and an HTTP API for accounts, study sessions and timers.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{Error, Result};
pub use state::{AppState, TimerState};
pub use utils::signals::shutdown_signal;
