//! Keeps a coordinator's local view in step with the signed-in owner.

use std::future::Future;

use tracing::debug;

use crate::domain::ports::SessionProvider;
use crate::domain::SyncEntity;

use super::MutationCoordinator;

/// Refresh `coordinator` now and on every owner change reported by `session`.
///
/// Signing out clears the view. The returned future completes when the
/// session provider is dropped; spawn it alongside the coordinator.
pub fn follow_session<E, S>(
    coordinator: MutationCoordinator<E>,
    session: &S,
) -> impl Future<Output = ()> + Send + 'static
where
    E: SyncEntity,
    S: SessionProvider + ?Sized,
{
    let mut owners = session.subscribe();
    async move {
        loop {
            let owner = owners.borrow_and_update().clone();
            debug!(
                collection = E::COLLECTION,
                owner = owner.as_ref().map(|o| o.as_ref()),
                "owner changed"
            );
            // Load failures are already reported by the coordinator.
            let _ = coordinator.refresh(owner).await;
            if owners.changed().await.is_err() {
                break;
            }
        }
    }
}
