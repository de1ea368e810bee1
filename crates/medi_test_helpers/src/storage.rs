//! Temporary storage directories for queue persistence tests

use assert_fs::TempDir;

/// Create a temporary storage directory for a queue store.
///
/// Cleaned up automatically when the `TempDir` is dropped; keep it alive for
/// the duration of the test or the persisted queue file disappears.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}
