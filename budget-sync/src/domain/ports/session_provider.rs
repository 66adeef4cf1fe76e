//! Driven port exposing the signed-in owner.

use tokio::sync::watch;

use crate::domain::OwnerId;

/// Source of the active owner id and its change signal.
///
/// `None` means nobody is signed in.
pub trait SessionProvider: Send + Sync {
    /// Owner currently signed in.
    fn current_owner(&self) -> Option<OwnerId>;

    /// Receiver that yields every owner change.
    fn subscribe(&self) -> watch::Receiver<Option<OwnerId>>;
}
