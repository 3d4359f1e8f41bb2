//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
    error::Error,
    state::{format_duration, StudySession},
    tasks::TimerSnapshot,
};

/// Generic response for actions without a richer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new("ok", message)
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error", message)
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidConfiguration(_)
            | Error::InvalidInput(_)
            | Error::InvalidEmail(_)
            | Error::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::EmailInUse(_) => StatusCode::CONFLICT,
            Error::Store(_) | Error::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: String,
    pub token: String,
}

/// Dashboard "start a new session" form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub subject: String,
    pub hours: Option<u32>,
    pub minutes: Option<u32>,
}

/// Direct handoff to the timer screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartTimerRequest {
    pub subject: String,
    pub pomodoro_sessions: u32,
}

/// Stored session with its display duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: StudySession,
    pub duration_display: String,
}

impl From<StudySession> for SessionView {
    fn from(session: StudySession) -> Self {
        Self {
            duration_display: format_duration(session.duration_minutes),
            session,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// Present when the record was stored
    pub session: Option<SessionView>,
    pub pomodoro_sessions: u32,
    /// Present when a timer was started
    pub timer: Option<TimerSnapshot>,
    pub warnings: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
    pub host: String,
    pub port: u16,
    pub active_timers: usize,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok(uptime: String, host: String, port: u16, active_timers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
            host,
            port,
            active_timers,
        }
    }
}
