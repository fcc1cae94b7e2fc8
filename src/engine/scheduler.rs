//! Periodic polling task.
//!
//! [`PollScheduler`] ticks a shared [`TailEngine`] on a fixed interval. The engine lock is taken
//! with `try_lock`: if a previous tick or a UI mutation still holds it, this tick is skipped
//! rather than queued.

use crate::engine::{TailEngine, TickOutcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Engine handle shared between the scheduler and the UI
pub type SharedEngine = Arc<Mutex<TailEngine>>;

/// Background task driving [`TailEngine::tick`]
pub struct PollScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
    skipped: Arc<AtomicU64>,
}

impl PollScheduler {
    /// Spawn the polling task. The first tick fires one `period` from now.
    pub fn start(engine: SharedEngine, period: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let skipped = Arc::new(AtomicU64::new(0));
        let skipped_counter = Arc::clone(&skipped);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            log::debug!("poll scheduler started ({period:?})");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Ok(mut guard) = engine.try_lock() else {
                            skipped_counter.fetch_add(1, Ordering::Relaxed);
                            log::trace!("engine busy; skipping tick");
                            continue;
                        };
                        if let TickOutcome::Progress(report) = guard.tick().await {
                            log::trace!("poll progress: {} bytes", report.bytes_read);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            log::debug!("poll scheduler stopped");
        });

        Self {
            shutdown,
            handle,
            skipped,
        }
    }

    /// Ticks dropped because the engine was busy
    pub fn ticks_skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the task and wait for it to finish its current tick
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            log::warn!("poll scheduler task failed: {err}");
        }
    }
}
