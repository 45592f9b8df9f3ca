//! Core admission gate implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::config::TurnstileConfig;
use crate::error::{Result, TurnstileError};

use super::sweeper::{self, SweeperHandle};

/// The outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The request is admitted; control passes through to the handler.
    Allow,
    /// The request arrived within the admission interval and is rejected.
    Reject,
}

impl Verdict {
    /// Whether this verdict admits the request.
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// State shared between the limiter and its reclamation task.
pub(crate) struct Shared {
    /// Minimum spacing between admitted requests per client. Also the
    /// reclamation period and the staleness threshold.
    pub(crate) interval: Duration,
    /// Last-admitted timestamp per client identifier. All reads and writes
    /// happen while holding the lock.
    pub(crate) clients: Mutex<HashMap<String, Instant>>,
}

impl Shared {
    /// Remove every client whose last admission is older than the interval.
    ///
    /// An entry exactly at the boundary is retained for one more cycle.
    /// Returns the number of entries removed.
    pub(crate) fn reclaim(&self, now: Instant) -> usize {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, last| now.duration_since(*last) <= self.interval);
        before - clients.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.clients.lock().len()
    }
}

/// Per-client request admission gate.
///
/// Each distinct client identifier is admitted at most once per configured
/// interval; requests arriving inside the interval are rejected without
/// shifting the window (the window is anchored to the last *admission*, not
/// the last attempt). A rejected flood therefore cannot lock a client out
/// past its next legitimate slot.
///
/// Each instance owns its client map, lock, and reclamation task, so
/// independently configured limiters never collide and tests can create
/// isolated instances. The struct is thread-safe; wrap it in an [`Arc`] to
/// share it across tasks.
pub struct Limiter {
    /// Map, lock, and interval, shared with the reclamation task
    shared: Arc<Shared>,
    /// Handle of the reclamation task, if started
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl Limiter {
    /// Create a new limiter with the given admission interval.
    ///
    /// Returns an error if the interval is zero.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(TurnstileError::Config(
                "admission interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                interval,
                clients: Mutex::new(HashMap::new()),
            }),
            sweeper: Mutex::new(None),
        })
    }

    /// Create a new limiter from a configuration.
    pub fn from_config(config: &TurnstileConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.interval())
    }

    /// Get the configured admission interval.
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Check whether a request from `client_id` is admitted right now,
    /// recording the admission if so.
    pub fn check_and_record(&self, client_id: &str) -> Verdict {
        self.check_at(client_id, Instant::now())
    }

    /// Check whether a request from `client_id` arriving at `now` is
    /// admitted, recording the admission if so.
    ///
    /// A client is admitted if it has never been seen, or if at least the
    /// configured interval has elapsed since its last admission. Rejected
    /// attempts are not recorded. The operation is total: identifiers are
    /// opaque and untrusted, and there are no error outcomes.
    pub fn check_at(&self, client_id: &str, now: Instant) -> Verdict {
        trace!(client = %client_id, "checking admission");

        let mut clients = self.shared.clients.lock();

        if let Some(last) = clients.get(client_id) {
            if now.duration_since(*last) < self.shared.interval {
                debug!(client = %client_id, "admission interval not elapsed, rejecting");
                return Verdict::Reject;
            }
        }

        clients.insert(client_id.to_string(), now);
        Verdict::Allow
    }

    /// Get the number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.shared.len()
    }

    /// Drop all tracked clients.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.shared.clients.lock().clear();
    }

    /// Start the background reclamation task.
    ///
    /// The task runs on the current tokio runtime and sweeps the client map
    /// once per admission interval, evicting entries older than the
    /// interval. Repeated calls on an instance whose task is already
    /// running are no-ops and return `false`; exactly one task runs per
    /// limiter no matter how many times it is attached.
    pub fn start_reclamation(&self) -> bool {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            debug!("reclamation task already running");
            return false;
        }

        *sweeper = Some(sweeper::spawn(Arc::clone(&self.shared)));
        info!(
            interval_ms = self.shared.interval.as_millis() as u64,
            "started reclamation task"
        );
        true
    }

    /// Whether the reclamation task is currently running.
    pub fn is_reclaiming(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Stop the reclamation task and wait for it to exit.
    ///
    /// A no-op if the task was never started. The limiter remains usable
    /// afterwards, and reclamation may be started again.
    pub async fn shutdown(&self) {
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
            info!("reclamation task stopped");
        }
    }
}
