//! Sync service wiring: queue + monitor + engine as one injectable instance
//!
//! Explicitly constructed and explicitly started, rather than ambient module
//! state, so tests can run several isolated instances side by side.

use crate::config::SyncConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::engine::{DrainReport, SyncEngine};
use crate::queue::QueueStore;
use crate::transport::{HttpTransport, Transport};
use medi_common::{NewRequest, QueuedRequest};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum Lifecycle {
    New,
    Running(JoinHandle<()>),
    Stopped,
}

/// Owns the sync subsystem for one process.
///
/// Consumers enqueue mutations after their optimistic local writes; the
/// connectivity monitor triggers background drains; `sync_now` is the one
/// designated manual entry point (pull-to-refresh).
pub struct SyncService {
    queue: Arc<QueueStore>,
    monitor: Arc<ConnectivityMonitor>,
    engine: Arc<SyncEngine>,
    lifecycle: Mutex<Lifecycle>,
}

impl SyncService {
    /// Build a service with an HTTP transport derived from the config
    pub fn new(config: SyncConfig) -> crate::Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(
            config.base_url.clone(),
            config.transport.request_config(),
        ));
        Self::with_transport(config, transport)
    }

    /// Build a service around an injected transport (test doubles)
    pub fn with_transport(
        config: SyncConfig,
        transport: Arc<dyn Transport>,
    ) -> crate::Result<Self> {
        config.validate()?;

        let queue = Arc::new(QueueStore::open(&config.storage_dir)?);
        let monitor = Arc::new(ConnectivityMonitor::new());
        let engine = Arc::new(SyncEngine::new(Arc::clone(&queue), transport));

        Ok(Self {
            queue,
            monitor,
            engine,
            lifecycle: Mutex::new(Lifecycle::New),
        })
    }

    /// Start the background drain worker and hook it to the monitor.
    ///
    /// Idempotent: calling again while running (or after shutdown) warns and
    /// changes nothing, so online transitions can never double-drain.
    pub fn initialize(&self) {
        let mut lifecycle = self.lifecycle();
        match &*lifecycle {
            Lifecycle::Running(_) => {
                tracing::warn!("Sync service already initialized; ignoring");
                return;
            }
            Lifecycle::Stopped => {
                tracing::warn!("Sync service already shut down; ignoring initialize");
                return;
            }
            Lifecycle::New => {}
        }

        let (trigger_tx, mut trigger_rx) = mpsc::unbounded_channel();
        self.monitor.initialize(trigger_tx);

        let engine = Arc::clone(&self.engine);
        let handle = tokio::spawn(async move {
            while let Some(trigger) = trigger_rx.recv().await {
                let report = engine.drain().await;
                tracing::debug!(?trigger, ?report, "Background drain finished");
            }
        });

        *lifecycle = Lifecycle::Running(handle);
        tracing::info!("Sync service initialized");
    }

    /// Stop the background worker. Terminal: the service cannot be restarted.
    pub fn shutdown(&self) {
        let mut lifecycle = self.lifecycle();
        if let Lifecycle::Running(handle) = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        {
            handle.abort();
            tracing::info!("Sync service shut down");
        }
    }

    /// Durably queue a mutation for replay.
    ///
    /// Fire-and-forget from the consumer's perspective; the returned record
    /// only confirms the intent was persisted.
    pub fn enqueue(&self, request: NewRequest) -> crate::Result<QueuedRequest> {
        self.queue.enqueue(request)
    }

    /// Manual drain (pull-to-refresh). Unlike background drains, the caller
    /// gets the report back and may surface this attempt's outcome.
    pub async fn sync_now(&self) -> DrainReport {
        self.engine.drain().await
    }

    /// Current published connectivity state
    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// The connectivity monitor, for the platform adapter feeding events
    /// and for consumers watching published state
    pub fn monitor(&self) -> Arc<ConnectivityMonitor> {
        Arc::clone(&self.monitor)
    }

    /// The durable queue (read access for consumers showing pending counts)
    pub fn queue(&self) -> Arc<QueueStore> {
        Arc::clone(&self.queue)
    }

    /// Drop every pending request. Full logout/reset only.
    pub fn clear_queue(&self) -> crate::Result<()> {
        self.queue.clear()
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// Service tests live in tests/service_tests.rs: they use ScriptedTransport
// from medi_test_helpers, which depends on this crate, so its Transport impl
// only unifies with the integration-test build of the library (not the
// lib-test build, which is a separate compilation).
