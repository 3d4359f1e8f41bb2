//! State management module
//! 
//! This module contains the timer state machine, session records and the
//! shared application state.

pub mod app_state;
pub mod study_session;
pub mod timer_event;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use study_session::{
    format_duration, planned_pomodoros, NewSession, SessionId, StudySession, UserId, UserProfile,
    MINUTES_PER_POMODORO, STUDY_MINUTES_PER_POMODORO,
};
pub use timer_event::{TimerEvent, TimerEventKind};
pub use timer_state::{format_mmss, Phase, PhaseEvent, TimerState, BREAK_SECONDS, STUDY_SECONDS};
