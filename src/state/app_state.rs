//! Main application state management

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tokio::sync::broadcast;
use tracing::info;

use super::{TimerEvent, UserId};
use crate::{
    error::{Error, Result},
    services::{AuthProvider, InMemoryAuth, InMemorySessionStore, SessionStore},
    tasks::{ActiveTimer, TimerSnapshot},
};

/// Main application state: collaborator handles, active timers and the
/// timer event bus
pub struct AppState {
    /// Identity provider
    pub auth: Arc<dyn AuthProvider>,
    /// Backing store for session records and profiles
    pub store: Arc<dyn SessionStore>,
    /// Period of every timer's tick source
    pub tick_period: Duration,
    /// One active timer per signed-in user
    timers: Mutex<HashMap<UserId, Arc<ActiveTimer>>>,
    /// Channel for timer phase changes
    pub timer_event_tx: broadcast::Sender<TimerEvent>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Create an AppState backed by the in-memory collaborators
    pub fn new(port: u16, host: String, tick_period: Duration, event_buffer: usize) -> Self {
        Self::with_collaborators(
            port,
            host,
            tick_period,
            event_buffer,
            Arc::new(InMemoryAuth::new()),
            Arc::new(InMemorySessionStore::new()),
        )
    }

    /// Create an AppState with explicitly supplied collaborators
    pub fn with_collaborators(
        port: u16,
        host: String,
        tick_period: Duration,
        event_buffer: usize,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let (timer_event_tx, _) = broadcast::channel(event_buffer.max(1));

        Self {
            auth,
            store,
            tick_period,
            timers: Mutex::new(HashMap::new()),
            timer_event_tx,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Resolve a bearer token to a signed-in user
    pub async fn authenticate(&self, token: &str) -> Result<UserId> {
        self.auth
            .current_user(token)
            .await
            .ok_or(Error::Unauthorized)
    }

    /// Hand a new timer to the user, disposing the one they had before
    pub fn start_timer(
        &self,
        user_id: &UserId,
        subject: &str,
        total_sessions_planned: u32,
    ) -> Result<TimerSnapshot> {
        let timer = Arc::new(ActiveTimer::new(
            user_id.clone(),
            subject.to_string(),
            total_sessions_planned,
            self.tick_period,
            self.timer_event_tx.clone(),
        )?);
        let snapshot = timer.snapshot()?;

        let previous = self
            .timers
            .lock()
            .map_err(|e| Error::poisoned("timers", e))?
            .insert(user_id.clone(), timer);
        if let Some(previous) = previous {
            info!(
                "Replacing timer {:?} for user {}",
                previous.subject(),
                user_id
            );
            previous.dispose();
        }

        Ok(snapshot)
    }

    /// The user's current timer
    pub fn active_timer(&self, user_id: &UserId) -> Result<Arc<ActiveTimer>> {
        self.timers
            .lock()
            .map_err(|e| Error::poisoned("timers", e))?
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("no active timer".to_string()))
    }

    /// Tear down the user's timer. Returns whether one existed.
    pub fn dispose_timer(&self, user_id: &UserId) -> Result<bool> {
        let removed = self
            .timers
            .lock()
            .map_err(|e| Error::poisoned("timers", e))?
            .remove(user_id);

        Ok(match removed {
            Some(timer) => {
                timer.dispose();
                info!("Disposed timer for user {}", user_id);
                true
            }
            None => false,
        })
    }

    /// Tear down every timer, e.g. on shutdown
    pub fn dispose_all_timers(&self) {
        let drained: Vec<_> = match self.timers.lock() {
            Ok(mut timers) => timers.drain().collect(),
            Err(poisoned) => poisoned.into_inner().drain().collect(),
        };

        for (_, timer) in &drained {
            timer.dispose();
        }
        info!("Disposed {} active timer(s)", drained.len());
    }

    pub fn active_timer_count(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Subscribe to phase change events of all timers
    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.timer_event_tx.subscribe()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
