//! Session store
//!
//! Holds each user's study session records and profile.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    state::{NewSession, SessionId, StudySession, UserId, UserProfile},
};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// All sessions recorded for the user, oldest first
    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<StudySession>>;

    async fn create_session(&self, user_id: &UserId, session: NewSession) -> Result<SessionId>;

    async fn put_profile(&self, user_id: &UserId, profile: UserProfile) -> Result<()>;

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>>;
}

#[derive(Debug, Default)]
struct UserRecords {
    profile: Option<UserProfile>,
    sessions: Vec<StudySession>,
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    users: Mutex<HashMap<UserId, UserRecords>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<StudySession>> {
        let users = self
            .users
            .lock()
            .map_err(|e| Error::Store(format!("Failed to lock session store: {}", e)))?;
        Ok(users
            .get(user_id)
            .map(|records| records.sessions.clone())
            .unwrap_or_default())
    }

    async fn create_session(&self, user_id: &UserId, session: NewSession) -> Result<SessionId> {
        let id = Uuid::new_v4().to_string();
        let mut users = self
            .users
            .lock()
            .map_err(|e| Error::Store(format!("Failed to lock session store: {}", e)))?;

        users
            .entry(user_id.clone())
            .or_default()
            .sessions
            .push(session.into_session(id.clone()));

        debug!("Stored session {} for user {}", id, user_id);
        Ok(id)
    }

    async fn put_profile(&self, user_id: &UserId, profile: UserProfile) -> Result<()> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| Error::Store(format!("Failed to lock session store: {}", e)))?;
        users.entry(user_id.clone()).or_default().profile = Some(profile);
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        let users = self
            .users
            .lock()
            .map_err(|e| Error::Store(format!("Failed to lock session store: {}", e)))?;
        Ok(users.get(user_id).and_then(|records| records.profile.clone()))
    }
}
