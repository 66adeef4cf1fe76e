//! Coalescing of identical in-flight GET requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

/// Output shared by every caller of one coalesced request.
pub(super) type SharedOutcome<T> = Shared<BoxFuture<'static, T>>;

/// Pending GET requests keyed by URL and serialised config.
///
/// An entry lives exactly as long as its request: the shared future removes
/// itself from the map when it settles.
pub(super) struct InFlight<T: Clone> {
    entries: Mutex<HashMap<String, SharedOutcome<T>>>,
}

impl<T: Clone + Send + Sync + 'static> InFlight<T> {
    pub(super) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Join the request already running under `key`, or start one with
    /// `start`.
    pub(super) fn join_or_start(
        self: &Arc<Self>,
        key: String,
        start: impl FnOnce() -> BoxFuture<'static, T>,
    ) -> SharedOutcome<T> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&key) {
            return existing.clone();
        }

        let registry = Arc::clone(self);
        let request = start();
        let entry_key = key.clone();
        let shared = async move {
            let outcome = request.await;
            registry.remove(&entry_key);
            outcome
        }
        .boxed()
        .shared();
        entries.insert(key, shared.clone());
        shared
    }

    pub(super) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
