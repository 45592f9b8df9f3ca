//! Background reclamation of stale client entries.
//!
//! Without reclamation every client identifier ever seen would stay in the
//! map forever. The sweep runs once per admission interval and evicts
//! entries whose last admission is older than the interval, bounding the
//! map to the clients active within the last cycle.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use super::limiter::Shared;

/// Handle to a running reclamation task.
///
/// Dropping the handle aborts the task, so a limiter that goes out of scope
/// without an explicit shutdown does not leak its timer.
pub(crate) struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signal the task to stop and wait for it to exit.
    pub(crate) async fn stop(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Spawn the reclamation task on the current runtime.
pub(crate) fn spawn(shared: Arc<Shared>) -> SweeperHandle {
    let (stop_tx, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run(shared, stop_rx));
    SweeperHandle {
        stop: stop_tx,
        task: Some(task),
    }
}

async fn run(shared: Arc<Shared>, mut stop: watch::Receiver<bool>) {
    let mut ticker = interval(shared.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick resolves immediately; the first sweep should come one
    // full period after start.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = shared.reclaim(Instant::now());
                if removed > 0 {
                    debug!(removed, remaining = shared.len(), "evicted stale clients");
                }
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
}
