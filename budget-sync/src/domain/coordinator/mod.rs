//! Optimistic mutation coordinator.
//!
//! The coordinator owns the in-memory view of one entity collection for the
//! active owner. Mutations are applied to the view synchronously, in call
//! order, and then reconciled against the backend on a spawned task:
//!
//! - `add` inserts an entity under a temporary id, then swaps in the
//!   backend's canonical entity or removes the placeholder.
//! - `update` and `remove` snapshot the whole collection first and restore
//!   that snapshot wholesale when the backend rejects the change.
//!
//! Reconciliation addresses entities by id, never by position. Each owner
//! change bumps a generation counter; a mutation that settles after the
//! owner changed leaves the new owner's view alone.

mod pending;
mod session;


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;
use tokio::sync::watch;
use tracing::debug;

use super::ports::EntityBackend;
use super::{EntityId, Error, FailureReporter, OwnerId, SyncEntity};

pub use pending::{MutationState, PendingMutation};
pub use session::follow_session;

#[derive(Debug)]
struct LocalView<E> {
    owner: Option<OwnerId>,
    generation: u64,
    entities: Vec<E>,
}

struct Inner<E: SyncEntity> {
    backend: Arc<dyn EntityBackend<E>>,
    reporter: FailureReporter,
    clock: Arc<dyn Clock + Send + Sync>,
    view: Mutex<LocalView<E>>,
}

/// Owner-scoped view of one collection with optimistic mutations.
///
/// Cloning is cheap; clones share the same view.
///
/// Mutation methods spawn their reconciliation with [`tokio::spawn`] and
/// must be called from within a Tokio runtime.
pub struct MutationCoordinator<E: SyncEntity> {
    inner: Arc<Inner<E>>,
}

impl<E: SyncEntity> Clone for MutationCoordinator<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// What a validated mutation needs to reconcile later.
struct Applied<E> {
    owner: OwnerId,
    generation: u64,
    snapshot: Vec<E>,
}

impl<E: SyncEntity> MutationCoordinator<E> {
    /// Build a coordinator with an empty view and no active owner.
    pub fn new(
        backend: Arc<dyn EntityBackend<E>>,
        reporter: FailureReporter,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                reporter,
                clock,
                view: Mutex::new(LocalView {
                    owner: None,
                    generation: 0,
                    entities: Vec::new(),
                }),
            }),
        }
    }

    /// Copy of the local view, speculative entries included.
    pub fn entities(&self) -> Vec<E> {
        self.inner.lock_view().entities.clone()
    }

    /// Owner the view currently belongs to.
    pub fn owner(&self) -> Option<OwnerId> {
        self.inner.lock_view().owner.clone()
    }

    /// Look up one entity in the local view.
    pub fn get(&self, id: &EntityId) -> Option<E> {
        self.inner
            .lock_view()
            .entities
            .iter()
            .find(|entity| entity.id() == id)
            .cloned()
    }

    /// Optimistically create an entity.
    ///
    /// On return the view already holds the new entity under a temporary id.
    pub fn add(&self, draft: E::Draft) -> PendingMutation<E> {
        let temporary_id = EntityId::temporary();
        let (state_tx, state_rx) = watch::channel(MutationState::Pending);
        let applied = {
            let mut view = self.inner.lock_view();
            view.owner.clone().map(|owner| {
                let entity = E::from_draft(
                    temporary_id.clone(),
                    owner.clone(),
                    &draft,
                    self.inner.clock.utc(),
                );
                view.entities.push(entity);
                (owner, view.generation)
            })
        };
        debug!(collection = E::COLLECTION, id = %temporary_id, "optimistic add applied");

        let inner = Arc::clone(&self.inner);
        let target = temporary_id.clone();
        let handle = tokio::spawn(async move {
            let action = format!("add {}", E::NOUN);
            let Some((owner, generation)) = applied else {
                return Err(inner
                    .roll_back(&state_tx, &action, Revert::Nothing, Error::no_active_owner())
                    .await);
            };
            match inner.backend.create(&owner, &draft).await {
                Ok(created) => {
                    inner.with_view(generation, |entities| {
                        // A failed concurrent mutation may have restored a
                        // snapshot taken before the placeholder existed.
                        if let Some(slot) = entities.iter_mut().find(|e| e.id() == &temporary_id) {
                            *slot = created.clone();
                        } else if !entities.iter().any(|e| e.id() == created.id()) {
                            entities.push(created.clone());
                        }
                    });
                    inner.confirm(&state_tx, "added", created.id()).await;
                    Ok(created)
                }
                Err(error) => {
                    let revert = Revert::DropPlaceholder {
                        generation,
                        id: temporary_id,
                    };
                    Err(inner.roll_back(&state_tx, &action, revert, error).await)
                }
            }
        });
        PendingMutation::new(target, state_rx, handle)
    }

    /// Optimistically apply a partial update to `id`.
    pub fn update(&self, id: EntityId, patch: E::Patch) -> PendingMutation<E> {
        let (state_tx, state_rx) = watch::channel(MutationState::Pending);
        let applied = self.inner.apply(&id, |entities, index| {
            entities[index].apply_patch(&patch);
        });

        let inner = Arc::clone(&self.inner);
        let target = id.clone();
        let handle = tokio::spawn(async move {
            let action = format!("update {}", E::NOUN);
            let Applied {
                owner,
                generation,
                snapshot,
            } = match applied {
                Ok(applied) => applied,
                Err(error) => {
                    return Err(inner.roll_back(&state_tx, &action, Revert::Nothing, error).await);
                }
            };
            match inner.backend.update(&owner, &id, &patch).await {
                Ok(updated) => {
                    inner.with_view(generation, |entities| {
                        if let Some(slot) = entities.iter_mut().find(|e| e.id() == &id) {
                            *slot = updated.clone();
                        }
                    });
                    inner.confirm(&state_tx, "updated", &id).await;
                    Ok(updated)
                }
                Err(error) => {
                    let revert = Revert::Restore {
                        generation,
                        snapshot,
                    };
                    Err(inner.roll_back(&state_tx, &action, revert, error).await)
                }
            }
        });
        PendingMutation::new(target, state_rx, handle)
    }

    /// Optimistically delete `id`.
    pub fn remove(&self, id: EntityId) -> PendingMutation<()> {
        let (state_tx, state_rx) = watch::channel(MutationState::Pending);
        let applied = self.inner.apply(&id, |entities, index| {
            entities.remove(index);
        });

        let inner = Arc::clone(&self.inner);
        let target = id.clone();
        let handle = tokio::spawn(async move {
            let action = format!("remove {}", E::NOUN);
            let Applied {
                owner,
                generation,
                snapshot,
            } = match applied {
                Ok(applied) => applied,
                Err(error) => {
                    return Err(inner.roll_back(&state_tx, &action, Revert::Nothing, error).await);
                }
            };
            match inner.backend.delete(&owner, &id).await {
                Ok(()) => {
                    inner.confirm(&state_tx, "removed", &id).await;
                    Ok(())
                }
                Err(error) => {
                    let revert = Revert::Restore {
                        generation,
                        snapshot,
                    };
                    Err(inner.roll_back(&state_tx, &action, revert, error).await)
                }
            }
        });
        PendingMutation::new(target, state_rx, handle)
    }

    /// Replace the view with the backend's state for `owner`.
    ///
    /// The view is cleared first; with no owner it stays empty. A load
    /// failure is reported once and returned.
    pub async fn refresh(&self, owner: Option<OwnerId>) -> Result<(), Error> {
        let generation = {
            let mut view = self.inner.lock_view();
            view.generation += 1;
            view.owner.clone_from(&owner);
            view.entities.clear();
            view.generation
        };
        let Some(owner) = owner else {
            return Ok(());
        };
        match self.inner.backend.get_all(&owner).await {
            Ok(entities) => {
                debug!(
                    collection = E::COLLECTION,
                    count = entities.len(),
                    "local view refreshed"
                );
                self.inner.with_view(generation, |view| *view = entities);
                Ok(())
            }
            Err(error) => {
                let action = format!("load {}", E::COLLECTION);
                Err(self.inner.reporter.report_failure(&action, error).await)
            }
        }
    }
}

/// How a rejected mutation is undone.
enum Revert<E> {
    /// The change was rejected before touching the view.
    Nothing,
    /// Remove the optimistic entity created by `add`.
    DropPlaceholder { generation: u64, id: EntityId },
    /// Put back the whole pre-mutation collection.
    Restore { generation: u64, snapshot: Vec<E> },
}

impl<E: SyncEntity> Inner<E> {
    fn lock_view(&self) -> MutexGuard<'_, LocalView<E>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the entities only if the owner has not changed since
    /// `generation`.
    fn with_view(&self, generation: u64, f: impl FnOnce(&mut Vec<E>)) -> bool {
        let mut view = self.lock_view();
        if view.generation != generation {
            debug!(collection = E::COLLECTION, "owner changed; reconciliation skipped");
            return false;
        }
        f(&mut view.entities);
        true
    }

    /// Validate `id`, snapshot the collection, and apply `change` in place.
    fn apply(
        &self,
        id: &EntityId,
        change: impl FnOnce(&mut Vec<E>, usize),
    ) -> Result<Applied<E>, Error> {
        let mut view = self.lock_view();
        let owner = view.owner.clone().ok_or_else(Error::no_active_owner)?;
        let index = view
            .entities
            .iter()
            .position(|entity| entity.id() == id)
            .ok_or_else(|| Error::not_found(id))?;
        if id.is_temporary() {
            return Err(Error::not_yet_confirmed(id));
        }
        let snapshot = view.entities.clone();
        change(&mut view.entities, index);
        debug!(collection = E::COLLECTION, %id, "optimistic change applied");
        Ok(Applied {
            owner,
            generation: view.generation,
            snapshot,
        })
    }

    async fn confirm(
        &self,
        state: &watch::Sender<MutationState>,
        verb: &str,
        id: &EntityId,
    ) {
        let _ = state.send(MutationState::Confirmed);
        debug!(collection = E::COLLECTION, %id, verb, "mutation confirmed");
        self.reporter
            .report_success(format!("{} {verb}", capitalise(E::NOUN)))
            .await;
    }

    /// Revert, then log and notify.
    async fn roll_back(
        &self,
        state: &watch::Sender<MutationState>,
        action: &str,
        revert: Revert<E>,
        error: Error,
    ) -> Error {
        match revert {
            Revert::Nothing => {}
            Revert::DropPlaceholder { generation, id } => {
                self.with_view(generation, |entities| entities.retain(|e| e.id() != &id));
            }
            Revert::Restore {
                generation,
                snapshot,
            } => {
                self.with_view(generation, |entities| *entities = snapshot);
            }
        }
        let _ = state.send(MutationState::RolledBack);
        self.reporter.report_failure(action, error).await
    }
}

fn capitalise(action: &str) -> String {
    let mut chars = action.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
