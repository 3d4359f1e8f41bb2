//! Pomodoro timer state machine
//!
//! Owns the countdown, the study/break phase and the session index. It has no
//! notion of wall-clock time: whoever drives it calls [`TimerState::tick`] once
//! per period and [`TimerState::advance_phase`] for manual skips.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length of a study phase in seconds (25 minutes)
pub const STUDY_SECONDS: u64 = 25 * 60;
/// Length of a break phase in seconds (5 minutes)
pub const BREAK_SECONDS: u64 = 5 * 60;

/// Which interval the countdown belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Study,
    Break,
}

impl Phase {
    /// Full allotment for this phase
    pub fn duration_seconds(&self) -> u64 {
        match self {
            Phase::Study => STUDY_SECONDS,
            Phase::Break => BREAK_SECONDS,
        }
    }
}

/// Notification raised when the timer switches phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseEvent {
    /// Study interval `session` finished, break running
    BreakStarted { session: u32 },
    /// Break finished, study interval `session` running
    BreakOver { session: u32 },
}

impl PhaseEvent {
    /// Human readable message for the UI
    pub fn message(&self) -> &'static str {
        match self {
            PhaseEvent::BreakStarted { .. } => "Time for a break!",
            PhaseEvent::BreakOver { .. } => "Break over! Time to study again.",
        }
    }
}

/// Countdown state for one study session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerState {
    total_sessions_planned: u32,
    current_session_index: u32,
    remaining_seconds: u64,
    phase: Phase,
    is_running: bool,
    is_completed: bool,
}

impl TimerState {
    /// Create a paused timer at the start of the first study interval.
    ///
    /// Fails with [`Error::InvalidConfiguration`] when no sessions are planned.
    pub fn new(total_sessions_planned: u32) -> Result<Self> {
        if total_sessions_planned == 0 {
            return Err(Error::InvalidConfiguration(
                "at least one pomodoro session must be planned (30 minutes or more)".to_string(),
            ));
        }

        Ok(Self {
            total_sessions_planned,
            current_session_index: 1,
            remaining_seconds: STUDY_SECONDS,
            phase: Phase::Study,
            is_running: false,
            is_completed: false,
        })
    }

    /// Flip between running and paused. Returns the new running flag.
    pub fn toggle_running(&mut self) -> bool {
        if !self.is_completed {
            self.is_running = !self.is_running;
        }
        self.is_running
    }

    /// Count down one second, switching phase when the countdown hits zero.
    ///
    /// Ticking a paused or completed timer does nothing.
    pub fn tick(&mut self) -> Option<PhaseEvent> {
        if !self.is_running || self.is_completed {
            return None;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.advance_phase()
        } else {
            None
        }
    }

    /// Move to the next phase immediately, discarding any remaining time.
    ///
    /// Used both for natural expiry and for manual skips. Leaving the last
    /// break completes the timer, which raises no phase event.
    pub fn advance_phase(&mut self) -> Option<PhaseEvent> {
        if self.is_completed {
            return None;
        }

        match self.phase {
            Phase::Study => {
                self.phase = Phase::Break;
                self.remaining_seconds = BREAK_SECONDS;
                Some(PhaseEvent::BreakStarted {
                    session: self.current_session_index,
                })
            }
            Phase::Break if self.current_session_index < self.total_sessions_planned => {
                self.current_session_index += 1;
                self.phase = Phase::Study;
                self.remaining_seconds = STUDY_SECONDS;
                Some(PhaseEvent::BreakOver {
                    session: self.current_session_index,
                })
            }
            Phase::Break => {
                self.is_completed = true;
                self.is_running = false;
                self.remaining_seconds = 0;
                None
            }
        }
    }

    pub fn total_sessions_planned(&self) -> u32 {
        self.total_sessions_planned
    }

    pub fn current_session_index(&self) -> u32 {
        self.current_session_index
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_mmss(self.remaining_seconds)
    }

    /// Heading shown above the countdown
    pub fn mode_label(&self) -> &'static str {
        if self.is_completed {
            "Session Completed!"
        } else {
            match self.phase {
                Phase::Study => "Study Time",
                Phase::Break => "Break Time",
            }
        }
    }
}

/// Format seconds as zero-padded `MM:SS`; minutes are not wrapped at 60
pub fn format_mmss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
