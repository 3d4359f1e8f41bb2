//! Events published on the timer bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PhaseEvent, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEventKind {
    BreakStarted { session: u32 },
    BreakOver { session: u32 },
    /// All planned sessions are done
    Completed,
}

impl From<PhaseEvent> for TimerEventKind {
    fn from(event: PhaseEvent) -> Self {
        match event {
            PhaseEvent::BreakStarted { session } => Self::BreakStarted { session },
            PhaseEvent::BreakOver { session } => Self::BreakOver { session },
        }
    }
}

/// A timer state change for one user's active timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub user_id: UserId,
    pub subject: String,
    pub kind: TimerEventKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl TimerEvent {
    pub fn new(user_id: UserId, subject: String, kind: TimerEventKind) -> Self {
        let message = match kind {
            TimerEventKind::BreakStarted { session } => {
                PhaseEvent::BreakStarted { session }.message()
            }
            TimerEventKind::BreakOver { session } => PhaseEvent::BreakOver { session }.message(),
            TimerEventKind::Completed => "Session Completed!",
        };

        Self {
            user_id,
            subject,
            kind,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}
