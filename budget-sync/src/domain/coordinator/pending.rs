//! Handle to one optimistic mutation in flight.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{EntityId, Error};

/// Lifecycle of an optimistic mutation.
///
/// Every mutation starts `Pending` and ends in exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// The speculative value is visible in the local view.
    Pending,
    /// The backend accepted the change and its value replaced the speculation.
    Confirmed,
    /// The backend rejected the change and the local view was reverted.
    RolledBack,
}

impl MutationState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Handle returned by every coordinator mutation.
///
/// Reconciliation runs on its own task, so dropping the handle never strands
/// a pending change.
#[derive(Debug)]
pub struct PendingMutation<T> {
    target: EntityId,
    state: watch::Receiver<MutationState>,
    handle: JoinHandle<Result<T, Error>>,
}

impl<T> PendingMutation<T> {
    pub(super) fn new(
        target: EntityId,
        state: watch::Receiver<MutationState>,
        handle: JoinHandle<Result<T, Error>>,
    ) -> Self {
        Self {
            target,
            state,
            handle,
        }
    }

    /// Id the mutation was applied to; temporary for an `add`.
    pub fn target(&self) -> &EntityId {
        &self.target
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MutationState {
        *self.state.borrow()
    }

    /// Receiver that observes state transitions.
    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.clone()
    }

    /// Wait for the backend outcome.
    ///
    /// By the time this resolves with an error the local view has been
    /// reverted and the failure has been logged and notified.
    pub async fn settle(self) -> Result<T, Error> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(Error::unknown(format!(
                "mutation task ended unexpectedly: {join_error}"
            ))),
        }
    }
}
