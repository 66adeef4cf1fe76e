//! Session provider backed by a Tokio watch channel.

use tokio::sync::watch;

use crate::domain::OwnerId;
use crate::domain::ports::SessionProvider;

/// Holds the signed-in owner and broadcasts changes.
#[derive(Debug)]
pub struct WatchSessionProvider {
    owner: watch::Sender<Option<OwnerId>>,
}

impl WatchSessionProvider {
    pub fn new(owner: Option<OwnerId>) -> Self {
        let (owner, _) = watch::channel(owner);
        Self { owner }
    }

    /// Replace the active owner; subscribers see the change only when it
    /// differs from the current one.
    pub fn set_owner(&self, owner: Option<OwnerId>) {
        self.owner.send_if_modified(|current| {
            if *current == owner {
                return false;
            }
            *current = owner;
            true
        });
    }
}

impl Default for WatchSessionProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionProvider for WatchSessionProvider {
    fn current_owner(&self) -> Option<OwnerId> {
        self.owner.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<OwnerId>> {
        self.owner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_owner_is_not_rebroadcast() {
        let session = WatchSessionProvider::default();
        let mut changes = session.subscribe();
        let alice = OwnerId::new("alice").expect("owner");

        session.set_owner(Some(alice.clone()));
        assert!(changes.has_changed().expect("open"));
        let _ = changes.borrow_and_update();

        session.set_owner(Some(alice.clone()));
        assert!(!changes.has_changed().expect("open"));
        assert_eq!(session.current_owner(), Some(alice));
    }
}
