//! Test logging configuration
//!
//! The sync engine logs every replay attempt and retry; with the full suite
//! running that drowns test output. These helpers install a test-writer
//! subscriber so drain logs only show up when a test opts in.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Initialize tracing for tests at the given level.
///
/// The global subscriber can only be set once per test process; later calls
/// (from other tests in the same binary) are ignored. `RUST_LOG` still wins
/// when set, so a single flaky drain test can be debugged with
/// `RUST_LOG=medi_sync=debug` without touching the code.
///
/// # Example
///
/// ```rust
/// use medi_test_helpers::logging::init_test_logging;
///
/// init_test_logging("debug");
/// // Engine replay/retry traces are now visible in failing test output.
/// ```
pub fn init_test_logging(level: &str) {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Silence replay/retry logs for clean test output.
///
/// Equivalent to `init_test_logging("error")` but more explicit.
pub fn suppress_logs() {
    init_test_logging("error");
}
