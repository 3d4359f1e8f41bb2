//! External collaborator module
//! 
//! This module contains the auth provider and session store interfaces with
//! their in-memory implementations, and statistics over stored sessions.

pub mod auth;
pub mod session_store;
pub mod stats;

// Re-export main types
pub use auth::{AuthProvider, AuthSession, InMemoryAuth};
pub use session_store::{InMemorySessionStore, SessionStore};
pub use stats::{summarize, DayStats, StudyStats};
