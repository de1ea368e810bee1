//! Shared test utilities for the MediDiet sync test suites
//!
//! # Modules
//!
//! - [`storage`]: temporary storage directories for queue persistence tests
//! - [`transport`]: a scripted/recording transport double for drain tests
//! - [`logging`]: test logging configuration
//!
//! # Example
//!
//! ```rust
//! use medi_test_helpers::prelude::*;
//!
//! fn my_test() {
//!     let dir = temp_dir();
//!     let transport = ScriptedTransport::new().fail_endpoint("/flaky");
//!     // Build a QueueStore / SyncEngine on top and assert on recorded calls.
//! }
//! ```

pub mod logging;
pub mod storage;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::logging::{init_test_logging, suppress_logs};
    pub use crate::storage::temp_dir;
    pub use crate::transport::{RecordedCall, ScriptedTransport};
}
