//! # MediDiet Sync Engine
//!
//! Offline-first synchronization: mutating requests made while offline are
//! queued durably and replayed against the remote API once connectivity
//! returns.
//!
//! ## Architecture
//!
//! - **Durable Queue**: ordered JSON-persisted list of pending mutations
//! - **Connectivity Monitor**: edge-detects offline → online transitions
//! - **Sync Engine**: drains the queue sequentially, at most one drain at a time
//! - **API Transport**: HTTP with per-attempt timeout and fixed-delay retry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use medi_sync::{SyncConfig, SyncService};
//! use medi_common::{Method, NewRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SyncConfig {
//!         base_url: "https://api.medidiet.app".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let service = SyncService::new(config)?;
//!     service.initialize();
//!
//!     // An optimistic local write happened; queue the remote mutation.
//!     service.enqueue(NewRequest {
//!         endpoint: "/logs".to_string(),
//!         method: Method::Post,
//!         payload: Some(serde_json::json!({"meal": "breakfast"})),
//!     })?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connectivity;
pub mod engine;
pub mod queue;
pub mod service;
pub mod transport;

pub use config::{SyncConfig, TransportConfig};
pub use connectivity::{ConnectivityMonitor, DrainTrigger, RawConnectivity};
pub use engine::{DrainReport, SyncEngine};
pub use queue::QueueStore;
pub use service::SyncService;
pub use transport::{ApiResponse, HttpTransport, RequestConfig, Transport, TransportError};

/// Common result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur during sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("queue persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("queue serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] transport::TransportError),

    #[error("configuration error: {0}")]
    Config(#[from] anyhow::Error),
}
