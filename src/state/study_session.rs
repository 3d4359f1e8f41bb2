//! Study session records and planning helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minutes of planned study that make up one pomodoro (25 study + 5 break)
pub const MINUTES_PER_POMODORO: u32 = 30;

/// Study minutes credited for each pomodoro
pub const STUDY_MINUTES_PER_POMODORO: u32 = 25;

/// Opaque user identifier handed out by the auth provider
pub type UserId = String;

/// Opaque identifier of a stored session record
pub type SessionId = String;

/// A stored study session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: SessionId,
    pub subject: String,
    pub duration_minutes: u32,
    pub pomodoro_sessions: u32,
    pub start_time: DateTime<Utc>,
}

/// Data needed to create a session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub subject: String,
    pub duration_minutes: u32,
    pub pomodoro_sessions: u32,
    pub start_time: DateTime<Utc>,
}

impl NewSession {
    /// Validate the dashboard form and derive the pomodoro count.
    ///
    /// The subject is required and at least one of hours or minutes must be
    /// given.
    pub fn from_form(
        subject: &str,
        hours: Option<u32>,
        minutes: Option<u32>,
        start_time: DateTime<Utc>,
    ) -> Result<Self> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(Error::InvalidInput("subject is required".to_string()));
        }
        if hours.is_none() && minutes.is_none() {
            return Err(Error::InvalidInput(
                "hours or minutes is required".to_string(),
            ));
        }

        let duration_minutes = hours
            .unwrap_or(0)
            .checked_mul(60)
            .and_then(|h| h.checked_add(minutes.unwrap_or(0)))
            .ok_or_else(|| Error::InvalidInput("duration is too long".to_string()))?;

        Ok(Self {
            subject: subject.to_string(),
            duration_minutes,
            pomodoro_sessions: planned_pomodoros(duration_minutes),
            start_time,
        })
    }

    /// Attach a store-assigned id
    pub fn into_session(self, id: SessionId) -> StudySession {
        StudySession {
            id,
            subject: self.subject,
            duration_minutes: self.duration_minutes,
            pomodoro_sessions: self.pomodoro_sessions,
            start_time: self.start_time,
        }
    }
}

/// Profile saved alongside the account at registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub name: String,
    pub email: String,
}

/// Number of whole pomodoros that fit in the planned minutes
pub fn planned_pomodoros(total_minutes: u32) -> u32 {
    total_minutes / MINUTES_PER_POMODORO
}

/// Format minutes as `"1h 30m"`, or `"45m"` under an hour
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
