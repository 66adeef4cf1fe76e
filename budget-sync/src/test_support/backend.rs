//! In-memory entity backend with scripted failures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::domain::ports::EntityBackend;
use crate::domain::{EntityId, Error, OwnerId, SyncEntity};

/// Backend that stores entities in memory and fails on demand.
///
/// Canonical ids are `{collection}-{n}` with `n` counting from 1.
pub struct ScriptedBackend<E: SyncEntity> {
    stored: Mutex<Vec<E>>,
    failures: Mutex<VecDeque<Error>>,
    gate: Option<Arc<Notify>>,
    next_id: AtomicUsize,
    mutations: AtomicUsize,
    loads: AtomicUsize,
}

impl<E: SyncEntity> Default for ScriptedBackend<E> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<E: SyncEntity> ScriptedBackend<E> {
    pub fn new(stored: Vec<E>) -> Self {
        Self {
            stored: Mutex::new(stored),
            failures: Mutex::new(VecDeque::new()),
            gate: None,
            next_id: AtomicUsize::new(1),
            mutations: AtomicUsize::new(0),
            loads: AtomicUsize::new(0),
        }
    }

    /// Hold every mutating call until `gate` is notified.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make the next mutating call fail with `error`.
    pub fn fail_next(&self, error: Error) {
        match self.failures.lock() {
            Ok(mut failures) => failures.push_back(error),
            Err(_) => panic!("failures mutex"),
        }
    }

    /// Entities the backend currently holds.
    pub fn stored(&self) -> Vec<E> {
        self.lock_stored().clone()
    }

    /// Create, update, and delete calls received.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// `get_all` calls received.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn lock_stored(&self) -> std::sync::MutexGuard<'_, Vec<E>> {
        match self.stored.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("stored mutex"),
        }
    }

    async fn begin_mutation(&self) -> Result<(), Error> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let failure = match self.failures.lock() {
            Ok(mut failures) => failures.pop_front(),
            Err(_) => panic!("failures mutex"),
        };
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl<E: SyncEntity> EntityBackend<E> for ScriptedBackend<E> {
    async fn get_all(&self, owner: &OwnerId) -> Result<Vec<E>, Error> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lock_stored()
            .iter()
            .filter(|entity| entity.owner_id() == owner)
            .cloned()
            .collect())
    }

    async fn create(&self, owner: &OwnerId, draft: &E::Draft) -> Result<E, Error> {
        self.begin_mutation().await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = EntityId::canonical(format!("{}-{n}", E::COLLECTION));
        let entity = E::from_draft(id, owner.clone(), draft, DateTime::<Utc>::default());
        self.lock_stored().push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, owner: &OwnerId, id: &EntityId, patch: &E::Patch) -> Result<E, Error> {
        self.begin_mutation().await?;
        let mut stored = self.lock_stored();
        let entity = stored
            .iter_mut()
            .find(|entity| entity.id() == id && entity.owner_id() == owner)
            .ok_or_else(|| Error::not_found(id))?;
        entity.apply_patch(patch);
        Ok(entity.clone())
    }

    async fn delete(&self, owner: &OwnerId, id: &EntityId) -> Result<(), Error> {
        self.begin_mutation().await?;
        let mut stored = self.lock_stored();
        let before = stored.len();
        stored.retain(|entity| !(entity.id() == id && entity.owner_id() == owner));
        if stored.len() == before {
            return Err(Error::not_found(id));
        }
        Ok(())
    }
}
