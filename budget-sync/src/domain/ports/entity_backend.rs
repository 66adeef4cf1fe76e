//! Driven port for the persistence backend behind the mutation coordinator.
//!
//! One uniform CRUD contract is served either by the embedded durable store
//! or by the remote REST API. Implementations map their own failures into
//! the domain [`Error`] taxonomy.

use async_trait::async_trait;

use crate::domain::{EntityId, Error, OwnerId, SyncEntity};

/// Uniform CRUD contract over one entity collection, scoped by owner.
#[async_trait]
pub trait EntityBackend<E: SyncEntity>: Send + Sync {
    /// Load every entity belonging to `owner`.
    async fn get_all(&self, owner: &OwnerId) -> Result<Vec<E>, Error>;

    /// Persist a new entity and return it with its canonical id.
    async fn create(&self, owner: &OwnerId, draft: &E::Draft) -> Result<E, Error>;

    /// Apply a partial update and return the authoritative entity.
    async fn update(&self, owner: &OwnerId, id: &EntityId, patch: &E::Patch)
    -> Result<E, Error>;

    /// Delete an entity.
    async fn delete(&self, owner: &OwnerId, id: &EntityId) -> Result<(), Error>;
}
