//! Active Pomodoro timer driven by a tick source

use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::TickSource;
use crate::{
    error::{Error, Result},
    state::{Phase, PhaseEvent, TimerEvent, TimerEventKind, TimerState, UserId},
};

/// Point-in-time view of a timer for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub subject: String,
    pub total_sessions_planned: u32,
    pub current_session_index: u32,
    pub remaining_seconds: u64,
    pub display: String,
    pub phase: Phase,
    pub mode: String,
    pub is_running: bool,
    pub is_completed: bool,
}

struct TimerSlot {
    timer: TimerState,
    /// Bumped whenever the tick source is replaced or cancelled
    generation: u64,
    source: Option<TickSource>,
}

/// A user's running Pomodoro timer.
///
/// At most one tick source is live at a time. The source is cancelled when
/// the timer is paused, completes, or is disposed (including on drop).
pub struct ActiveTimer {
    user_id: UserId,
    subject: String,
    tick_period: Duration,
    slot: Arc<Mutex<TimerSlot>>,
    events: broadcast::Sender<TimerEvent>,
}

impl ActiveTimer {
    pub fn new(
        user_id: UserId,
        subject: String,
        total_sessions_planned: u32,
        tick_period: Duration,
        events: broadcast::Sender<TimerEvent>,
    ) -> Result<Self> {
        let timer = TimerState::new(total_sessions_planned)?;
        info!(
            "Created timer for user {}: subject={:?}, sessions={}",
            user_id, subject, total_sessions_planned
        );

        Ok(Self {
            user_id,
            subject,
            tick_period,
            slot: Arc::new(Mutex::new(TimerSlot {
                timer,
                generation: 0,
                source: None,
            })),
            events,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Start or pause the countdown
    pub fn toggle(&self) -> Result<TimerSnapshot> {
        let mut slot = self.lock()?;

        if !slot.timer.is_completed() {
            let running = slot.timer.toggle_running();
            self.replace_source(&mut slot, running);
            info!(
                "Timer for user {} {}",
                self.user_id,
                if running { "started" } else { "paused" }
            );
        }

        Ok(self.snapshot_of(&slot.timer))
    }

    /// Jump to the next phase right away
    pub fn skip(&self) -> Result<TimerSnapshot> {
        let mut slot = self.lock()?;

        let was_completed = slot.timer.is_completed();
        let event = slot.timer.advance_phase();
        info!(
            "Timer for user {} skipped to {:?} (session {})",
            self.user_id,
            slot.timer.phase(),
            slot.timer.current_session_index()
        );

        publish(&self.events, &self.user_id, &self.subject, event);
        if slot.timer.is_completed() && !was_completed {
            self.replace_source(&mut slot, false);
            publish_completed(&self.events, &self.user_id, &self.subject);
        }

        Ok(self.snapshot_of(&slot.timer))
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot> {
        let slot = self.lock()?;
        Ok(self.snapshot_of(&slot.timer))
    }

    /// Cancel the tick source unconditionally
    pub fn dispose(&self) {
        match self.slot.lock() {
            Ok(mut slot) => self.replace_source(&mut slot, false),
            Err(poisoned) => self.replace_source(&mut poisoned.into_inner(), false),
        }
        debug!("Disposed timer for user {}", self.user_id);
    }

    /// Whether a tick source is currently attached
    pub fn has_tick_source(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.source.as_ref().is_some_and(|s| !s.is_finished()))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, TimerSlot>> {
        self.slot.lock().map_err(|e| Error::poisoned("timer state", e))
    }

    fn replace_source(&self, slot: &mut TimerSlot, run: bool) {
        slot.generation += 1;
        if let Some(source) = slot.source.take() {
            source.cancel();
        }
        if run {
            slot.source = Some(self.spawn_tick_source(slot.generation));
        }
    }

    fn spawn_tick_source(&self, generation: u64) -> TickSource {
        let slot = Arc::downgrade(&self.slot);
        let events = self.events.clone();
        let user_id = self.user_id.clone();
        let subject = self.subject.clone();

        TickSource::spawn(self.tick_period, move || {
            let Some(slot) = slot.upgrade() else {
                return ControlFlow::Break(());
            };
            let Ok(mut slot) = slot.lock() else {
                return ControlFlow::Break(());
            };
            // A tick from a replaced source must not touch the timer
            if slot.generation != generation {
                return ControlFlow::Break(());
            }

            let event = slot.timer.tick();
            publish(&events, &user_id, &subject, event);

            if slot.timer.is_completed() {
                info!("Timer for user {} completed", user_id);
                publish_completed(&events, &user_id, &subject);
                slot.generation += 1;
                slot.source = None;
                ControlFlow::Break(())
            } else if !slot.timer.is_running() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    fn snapshot_of(&self, timer: &TimerState) -> TimerSnapshot {
        TimerSnapshot {
            subject: self.subject.clone(),
            total_sessions_planned: timer.total_sessions_planned(),
            current_session_index: timer.current_session_index(),
            remaining_seconds: timer.remaining_seconds(),
            display: timer.display(),
            phase: timer.phase(),
            mode: timer.mode_label().to_string(),
            is_running: timer.is_running(),
            is_completed: timer.is_completed(),
        }
    }
}

impl Drop for ActiveTimer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn publish(
    events: &broadcast::Sender<TimerEvent>,
    user_id: &UserId,
    subject: &str,
    event: Option<PhaseEvent>,
) {
    if let Some(event) = event {
        info!("User {}: {}", user_id, event.message());
        send(events, TimerEvent::new(user_id.clone(), subject.to_string(), event.into()));
    }
}

fn publish_completed(events: &broadcast::Sender<TimerEvent>, user_id: &UserId, subject: &str) {
    send(
        events,
        TimerEvent::new(user_id.clone(), subject.to_string(), TimerEventKind::Completed),
    );
}

fn send(events: &broadcast::Sender<TimerEvent>, event: TimerEvent) {
    if let Err(e) = events.send(event) {
        debug!("No timer event subscribers: {}", e);
    }
}
