//! Timer-driven progress refresh as an explicit cancellable task.
//!
//! The display layer polls [`project`](crate::progress::project) on a fixed
//! cadence; this module owns that loop so cancellation is guaranteed on
//! teardown instead of being left to a forgotten timer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::progress::{self, ProgressSnapshot};
use crate::rule::{RecurrenceRule, RuleError};

/// Handle to a running progress monitor.
///
/// [`stop`](Self::stop) is the orderly shutdown path; dropping the handle
/// also ends the task, since the task observes its channels closing.
pub struct ProgressMonitor {
    snapshot_rx: watch::Receiver<ProgressSnapshot>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ProgressMonitor {
    /// ## Summary
    /// Spawns a task that re-projects progress on a fixed cadence and
    /// publishes every snapshot on a watch channel.
    ///
    /// ## Errors
    /// Returns an error if the initial projection fails; a rule that cannot
    /// produce a due date is not worth polling.
    pub fn spawn(
        rule: RecurrenceRule,
        last_complete: DateTime<Utc>,
        poll_interval: Duration,
    ) -> Result<Self, RuleError> {
        let initial = progress::project(&rule, last_complete, Utc::now())?;
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match progress::project(&rule, last_complete, Utc::now()) {
                            Ok(snapshot) => {
                                if snapshot_tx.send(snapshot).is_err() {
                                    // Every receiver is gone.
                                    break;
                                }
                            }
                            Err(error) => {
                                tracing::warn!(%error, "progress projection failed, stopping monitor");
                                break;
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            snapshot_rx,
            shutdown_tx,
            task,
        })
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// A receiver observing every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.snapshot_rx.clone()
    }

    /// ## Summary
    /// Signals the polling task to stop and waits for it to finish.
    pub async fn stop(self) {
        self.shutdown_tx.send(true).ok();
        if let Err(error) = self.task.await {
            if error.is_panic() {
                tracing::error!(%error, "progress monitor task panicked");
            }
        }
    }
}
