//! Error types shared across the crate

use thiserror::Error;

/// Errors produced by the timer, the collaborators and the HTTP layer
#[derive(Debug, Error)]
pub enum Error {
    /// Timer construction input that cannot produce a valid countdown
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("email already in use: {0}")]
    EmailInUse(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("not signed in")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    /// Session store failure
    #[error("store error: {0}")]
    Store(String),

    /// Shared state could not be accessed (poisoned lock)
    #[error("state error: {0}")]
    State(String),
}

impl Error {
    /// Build a `State` error from a poisoned lock
    pub fn poisoned<T>(what: &str, err: std::sync::PoisonError<T>) -> Self {
        Self::State(format!("Failed to lock {}: {}", what, err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
