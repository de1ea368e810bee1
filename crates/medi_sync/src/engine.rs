//! Sync engine: drains the durable queue against the remote API
//!
//! One drain replays the snapshot of items present when it started, strictly
//! in queue order. Items enqueued mid-drain wait for the next trigger.

use crate::queue::QueueStore;
use crate::transport::Transport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of one drain request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainReport {
    /// The snapshot was fully iterated
    Completed {
        attempted: usize,
        succeeded: usize,
        failed: usize,
    },

    /// Another drain was already in progress; this trigger was dropped
    Skipped,
}

/// Replays queued mutations, at most one drain at a time.
///
/// Failures are non-fatal to the batch: a failed item gets its retry counter
/// bumped and stays queued for the next trigger, and iteration continues.
/// Background callers never see per-item errors; the report is the only
/// observable result.
pub struct SyncEngine {
    queue: Arc<QueueStore>,
    transport: Arc<dyn Transport>,
    draining: AtomicBool,
}

/// Clears the drain flag when the drain future completes or is dropped.
///
/// A drain suspended at a transport await can be cancelled (worker aborted
/// on shutdown); the flag must still be released or every later drain would
/// be skipped forever.
struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl SyncEngine {
    pub fn new(queue: Arc<QueueStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            queue,
            transport,
            draining: AtomicBool::new(false),
        }
    }

    /// Replay every item present in the queue right now, in FIFO order.
    ///
    /// The check-and-set of the drain flag happens synchronously, with no
    /// suspension point in between, so two overlapping drains are impossible;
    /// a concurrent trigger returns [`DrainReport::Skipped`].
    pub async fn drain(&self) -> DrainReport {
        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Drain already in progress, dropping trigger");
            return DrainReport::Skipped;
        }
        let _guard = DrainGuard {
            flag: &self.draining,
        };

        let snapshot = self.queue.list();
        tracing::debug!("Draining {} queued requests", snapshot.len());

        let mut succeeded = 0;
        let mut failed = 0;

        // Sequential on purpose: a DELETE must not race ahead of an earlier
        // POST against the same resource.
        for item in &snapshot {
            match self
                .transport
                .dispatch(item.method, &item.endpoint, item.payload.as_ref())
                .await
            {
                Ok(response) => {
                    tracing::debug!(
                        id = %item.id,
                        status = response.status,
                        "Replayed {} {}", item.method, item.endpoint,
                    );
                    if let Err(error) = self.queue.dequeue(&item.id) {
                        tracing::error!(id = %item.id, %error, "Failed to persist dequeue");
                    }
                    succeeded += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        id = %item.id,
                        endpoint = %item.endpoint,
                        %error,
                        "Replay failed, leaving item for next drain",
                    );
                    if let Err(error) = self.queue.increment_retry(&item.id) {
                        tracing::error!(id = %item.id, %error, "Failed to persist retry count");
                    }
                    failed += 1;
                }
            }
        }

        DrainReport::Completed {
            attempted: snapshot.len(),
            succeeded,
            failed,
        }
    }

    /// Whether a drain is currently iterating its snapshot
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }
}

// Drain tests live in tests/engine_tests.rs: they use ScriptedTransport from
// medi_test_helpers, which depends on this crate, so its Transport impl only
// unifies with the integration-test build of the library (not the lib-test
// build, which is a separate compilation).
