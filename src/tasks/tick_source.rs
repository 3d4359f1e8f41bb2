//! Cancellable periodic tick source

use std::{ops::ControlFlow, time::Duration};

use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval_at, Instant},
};
use tracing::debug;

/// A background task that calls a closure once per period until cancelled
/// or until the closure asks to stop.
///
/// The first call happens one full period after spawning.
#[derive(Debug)]
pub struct TickSource {
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TickSource {
    /// Spawn on the current tokio runtime
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);

            loop {
                tokio::select! {
                    biased;

                    _ = &mut cancel_rx => {
                        debug!("Tick source cancelled");
                        break;
                    }

                    _ = interval.tick() => {
                        if on_tick().is_break() {
                            debug!("Tick source stopped by its callback");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            cancel_tx: Some(cancel_tx),
            handle,
        }
    }

    /// Stop the task. No callback runs after the task next yields.
    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            // Err only if the task already exited; abort below covers the rest
            let _ = tx.send(());
        }
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
