//! Background Reclaimer
//!
//! Expiry in LapseKV is a predicate evaluated on access, so nothing ever has
//! to be deleted for the operation contract to hold. Dead items do keep
//! occupying memory until they are replaced or deleted, though, and a key
//! that is never touched again would stay forever.
//!
//! The reclaimer is an optional tokio task that physically removes dead
//! items. A pass runs:
//! - right after every [`Engine::advance_clock`], since that is when a
//!   logical clock can kill items
//! - on a wall-time poll, for clocks that move by themselves; the poll
//!   halves its interval when a pass finds many dead entries and doubles it
//!   when a pass finds none
//!
//! Nothing it does is observable through the operation contract.

use super::Engine;
use crate::clock::Time;
use crate::config::ReclaimConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// A handle to the running reclaimer.
///
/// When this handle is dropped, the reclaimer task is stopped.
#[derive(Debug)]
pub struct Reclaimer {
    shutdown_tx: watch::Sender<bool>,
}

impl Reclaimer {
    /// Starts the reclaimer as a background task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use lapsekv::engine::{Engine, Reclaimer};
    /// use lapsekv::config::ReclaimConfig;
    /// use std::sync::Arc;
    ///
    /// let engine = Arc::new(Engine::with_manual_clock());
    /// let reclaimer = Reclaimer::start(engine, ReclaimConfig::default());
    ///
    /// // Dropping the handle stops the task
    /// drop(reclaimer);
    /// ```
    pub fn start(engine: Arc<Engine>, config: ReclaimConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let advances = engine.clock_advances();
        tokio::spawn(reclaim_loop(engine, config, advances, shutdown_rx));

        info!("Background reclaimer started");

        Self { shutdown_tx }
    }

    /// Stops the reclaimer. Called automatically on drop.
    pub fn stop(&self) {
        if !*self.shutdown_tx.borrow() {
            let _ = self.shutdown_tx.send(true);
            info!("Background reclaimer stopped");
        }
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// What woke the reclaimer up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Poll,
    ClockAdvance,
}

async fn reclaim_loop(
    engine: Arc<Engine>,
    config: ReclaimConfig,
    mut advances: watch::Receiver<Time>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = config.base_interval;

    loop {
        let trigger = tokio::select! {
            biased;

            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Reclaimer received shutdown signal");
                    return;
                }
                continue;
            }
            changed = advances.changed() => {
                if changed.is_err() {
                    return;
                }
                Trigger::ClockAdvance
            }
            _ = tokio::time::sleep(interval) => Trigger::Poll,
        };

        let entries = engine.store().len();
        let reclaimed = engine.reclaim_expired();

        match trigger {
            Trigger::ClockAdvance => {
                let now = *advances.borrow();
                if reclaimed > 0 {
                    debug!(now, reclaimed, "Clock advanced, dead items reclaimed");
                }
            }
            Trigger::Poll => {
                let next = next_interval(&config, interval, entries, reclaimed);
                if next != interval {
                    trace!(
                        reclaimed,
                        entries,
                        new_interval_ms = next.as_millis(),
                        "Reclaimer interval adjusted"
                    );
                }
                interval = next;
            }
        }
    }
}

/// Picks the poll interval after a pass that found `reclaimed` dead items
/// among `entries`.
fn next_interval(
    config: &ReclaimConfig,
    current: Duration,
    entries: usize,
    reclaimed: u64,
) -> Duration {
    if entries == 0 {
        return current;
    }

    let dead_rate = reclaimed as f64 / entries as f64;
    if dead_rate > config.speedup_threshold {
        (current / 2).max(config.min_interval)
    } else if dead_rate < config.slowdown_threshold {
        (current * 2).min(config.max_interval)
    } else {
        current
    }
}
