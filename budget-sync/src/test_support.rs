//! Test utilities for the budget-sync crate.
//!
//! Shared doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for `cfg(test)` and behind the `test-support` feature.

mod backend;
mod clock;
mod collaborators;
mod http;

pub use backend::ScriptedBackend;
pub use clock::MutableClock;
pub use collaborators::{RecordingLogger, RecordingNotifier, RecordingSession};
pub use http::{ImmediateSleeper, NoJitter, RecordingSleeper, ScriptedExecutor};

/// Fresh temporary directory for an embedded store.
///
/// # Panics
///
/// Panics when the directory cannot be created.
pub fn temp_store_dir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("failed to create temporary store directory: {error}"),
    }
}
