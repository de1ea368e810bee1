//! Durable queue of pending mutations
//!
//! Holds the ordered list of [`QueuedRequest`] records and persists it as a
//! JSON array after every mutation. The whole file is rewritten each time;
//! fine at the expected depth (tens of items), and deliberately not an
//! append-only log.

use medi_common::{NewRequest, QueuedRequest};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// File name for the persisted queue, kept separate from other app state
pub const QUEUE_FILE_NAME: &str = "medidiet-sync-storage.json";

const ID_LEN: usize = 9;

/// Ordered, durable store of pending mutation requests.
///
/// Shared between consumers (enqueue) and the sync engine (dequeue /
/// retry-increment). Every mutating method does its read-modify-write and
/// the full-file persist inside one lock scope, with no await points, so
/// writes are never torn under cooperative interleaving.
pub struct QueueStore {
    path: PathBuf,
    items: Mutex<Vec<QueuedRequest>>,
}

impl QueueStore {
    /// Open the store, loading any queue persisted by a previous process.
    ///
    /// A missing file means an empty queue, not an error.
    pub fn open(storage_dir: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = storage_dir.into().join(QUEUE_FILE_NAME);

        let items = if path.exists() {
            let data = fs::read(&path)?;
            let items: Vec<QueuedRequest> = serde_json::from_slice(&data)?;
            tracing::info!("Loaded {} pending requests from {:?}", items.len(), path);
            items
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Add a mutation to the end of the queue.
    ///
    /// Assigns a fresh unique id, stamps the enqueue time and a zero retry
    /// counter, then persists. Success guarantees durability of the intent,
    /// not delivery.
    pub fn enqueue(&self, request: NewRequest) -> crate::Result<QueuedRequest> {
        let mut items = self.lock();

        let queued = QueuedRequest {
            id: fresh_id(&items),
            endpoint: request.endpoint,
            method: request.method,
            payload: request.payload,
            enqueued_at: chrono::Utc::now().timestamp_millis(),
            retry_count: 0,
        };

        items.push(queued.clone());
        self.persist(&items)?;

        tracing::debug!(id = %queued.id, endpoint = %queued.endpoint, "Queued request");
        Ok(queued)
    }

    /// Remove the item with matching id after a confirmed successful replay.
    ///
    /// Returns `Ok(false)` when no such item exists; a second call for the
    /// same id is a no-op, not an error.
    pub fn dequeue(&self, id: &str) -> crate::Result<bool> {
        let mut items = self.lock();
        let before = items.len();
        items.retain(|item| item.id != id);

        if items.len() == before {
            return Ok(false);
        }
        self.persist(&items)?;
        Ok(true)
    }

    /// Bump the retry counter of the item with matching id.
    ///
    /// No-op when the item is gone (completed concurrently).
    pub fn increment_retry(&self, id: &str) -> crate::Result<bool> {
        let mut items = self.lock();

        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        item.retry_count += 1;

        self.persist(&items)?;
        Ok(true)
    }

    /// Snapshot of the queue in insertion order
    pub fn list(&self) -> Vec<QueuedRequest> {
        self.lock().clone()
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Empty the queue and persist.
    ///
    /// Used on full logout/reset only; normal retry logic never clears.
    pub fn clear(&self) -> crate::Result<()> {
        let mut items = self.lock();
        items.clear();
        self.persist(&items)?;

        tracing::info!("Cleared sync queue");
        Ok(())
    }

    /// Path of the persisted queue file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueuedRequest>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, items: &[QueuedRequest]) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(items)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Generate a 9-character alphanumeric id not already present in the queue
fn fresh_id(items: &[QueuedRequest]) -> String {
    loop {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_LEN)
            .map(char::from)
            .collect();

        if !items.iter().any(|item| item.id == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medi_common::Method;
    use medi_test_helpers::prelude::*;

    fn post(endpoint: &str, payload: serde_json::Value) -> NewRequest {
        NewRequest {
            endpoint: endpoint.to_string(),
            method: Method::Post,
            payload: Some(payload),
        }
    }

    #[test]
    fn test_enqueue_preserves_fifo_order() {
        let dir = temp_dir();
        let store = QueueStore::open(dir.path()).unwrap();

        for i in 0..5 {
            store
                .enqueue(post(&format!("/logs/{i}"), serde_json::json!({ "i": i })))
                .unwrap();
        }

        let items = store.list();
        assert_eq!(items.len(), 5);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.endpoint, format!("/logs/{i}"));
            assert_eq!(item.retry_count, 0);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let dir = temp_dir();
        let store = QueueStore::open(dir.path()).unwrap();

        for _ in 0..20 {
            store.enqueue(post("/logs", serde_json::json!({}))).unwrap();
        }

        let items = store.list();
        let mut ids: Vec<_> = items.iter().map(|item| item.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_dequeue_is_idempotent() {
        let dir = temp_dir();
        let store = QueueStore::open(dir.path()).unwrap();

        let queued = store.enqueue(post("/logs", serde_json::json!({}))).unwrap();

        assert!(store.dequeue(&queued.id).unwrap());
        assert!(!store.dequeue(&queued.id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_increment_retry_missing_id_is_noop() {
        let dir = temp_dir();
        let store = QueueStore::open(dir.path()).unwrap();

        assert!(!store.increment_retry("nosuchid1").unwrap());

        let queued = store.enqueue(post("/logs", serde_json::json!({}))).unwrap();
        assert!(store.increment_retry(&queued.id).unwrap());
        assert!(store.increment_retry(&queued.id).unwrap());
        assert_eq!(store.list()[0].retry_count, 2);
    }

    #[test]
    fn test_survives_restart() {
        let dir = temp_dir();

        let first = QueueStore::open(dir.path()).unwrap();
        for i in 0..3 {
            first
                .enqueue(post(&format!("/meals/{i}"), serde_json::json!({ "i": i })))
                .unwrap();
        }
        let before = first.list();
        drop(first);

        // Simulated process restart: reload from disk.
        let second = QueueStore::open(dir.path()).unwrap();
        assert_eq!(second.list(), before);
    }

    #[test]
    fn test_clear_empties_and_persists() {
        let dir = temp_dir();

        let store = QueueStore::open(dir.path()).unwrap();
        store.enqueue(post("/logs", serde_json::json!({}))).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        drop(store);

        let reopened = QueueStore::open(dir.path()).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_missing_file_means_empty_queue() {
        let dir = temp_dir();
        let store = QueueStore::open(dir.path().join("never-written")).unwrap();
        assert!(store.is_empty());
    }
}
