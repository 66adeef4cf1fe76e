//! Embedded durable store.
//!
//! Each `(collection, owner)` pair is one JSON document in the store
//! directory, named after the SHA-256 of the owner id so arbitrary ids never
//! reach the file system. Every write replaces the whole document
//! atomically after passing the [`StoreQuota`] check.

mod atomic_io;
mod quota;

use std::collections::HashMap;
use std::io;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock, PoisonError, Weak};

use async_trait::async_trait;
use camino::{FromPathBufError, Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use mockable::Clock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{EntityBackend, define_port_error};
use crate::domain::{EntityId, Error, OwnerId, SyncEntity};

pub use quota::{DEFAULT_QUOTA_BYTES, StoreQuota};

const DOCUMENT_VERSION: u32 = 1;

define_port_error! {
    /// Errors raised while opening the store directory.
    pub enum EmbeddedStoreError {
        /// The directory could not be created or opened.
        Open { path: String, message: String } =>
            "failed to open embedded store at {path}: {message}",
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument<E> {
    version: u32,
    entities: Vec<E>,
}

/// An open store directory.
///
/// Every store opened on the same directory in this process shares one
/// root, so quota checks of different collections never interleave.
struct StoreRoot {
    dir: Dir,
    /// Serialises read-modify-write cycles across collections.
    write_lock: Mutex<()>,
}

static OPEN_ROOTS: LazyLock<std::sync::Mutex<HashMap<Utf8PathBuf, Weak<StoreRoot>>>> =
    LazyLock::new(Default::default);

impl StoreRoot {
    /// Create the directory if needed and return the root open on it.
    fn shared(path: &Utf8Path) -> io::Result<Arc<Self>> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let key = Utf8PathBuf::try_from(std::fs::canonicalize(path)?)
            .map_err(FromPathBufError::into_io_error)?;
        let mut roots = OPEN_ROOTS.lock().unwrap_or_else(PoisonError::into_inner);
        roots.retain(|_, root| root.strong_count() > 0);
        if let Some(root) = roots.get(&key).and_then(Weak::upgrade) {
            return Ok(root);
        }
        let root = Arc::new(Self {
            dir: Dir::open_ambient_dir(&key, ambient_authority())?,
            write_lock: Mutex::new(()),
        });
        roots.insert(key, Arc::downgrade(&root));
        Ok(root)
    }
}

/// Durable local backend for one entity collection.
pub struct EmbeddedStore<E> {
    root: Arc<StoreRoot>,
    quota: StoreQuota,
    clock: Arc<dyn Clock + Send + Sync>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> EmbeddedStore<E>
where
    E: SyncEntity + Serialize + DeserializeOwned,
{
    /// Open (creating if needed) the store directory at `path`.
    ///
    /// Stores of different collections opened on the same directory share
    /// its write lock.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or opened.
    pub fn open(
        path: &Utf8Path,
        quota: StoreQuota,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, EmbeddedStoreError> {
        let root = StoreRoot::shared(path)
            .map_err(|err| EmbeddedStoreError::open(path.as_str(), err.to_string()))?;
        Ok(Self {
            root,
            quota,
            clock,
            _entity: PhantomData,
        })
    }

    /// Load the owner's document, let `change` edit it, and persist the
    /// result when `change` reports an edit.
    async fn modify<R, F>(&self, owner: &OwnerId, change: F) -> Result<R, Error>
    where
        R: Send + 'static,
        F: FnOnce(&mut Vec<E>) -> Result<(R, bool), Error> + Send + 'static,
    {
        let _guard = self.root.write_lock.lock().await;
        let root = Arc::clone(&self.root);
        let name = document_name(E::COLLECTION, owner);
        let quota = self.quota;
        run_blocking(move || {
            let mut entities = read_document::<E>(&root.dir, &name)?;
            let (result, changed) = change(&mut entities)?;
            if changed {
                write_document(&root.dir, &name, quota, entities)?;
            }
            Ok(result)
        })
        .await
    }
}

#[async_trait]
impl<E> EntityBackend<E> for EmbeddedStore<E>
where
    E: SyncEntity + Serialize + DeserializeOwned,
{
    async fn get_all(&self, owner: &OwnerId) -> Result<Vec<E>, Error> {
        let root = Arc::clone(&self.root);
        let name = document_name(E::COLLECTION, owner);
        run_blocking(move || read_document::<E>(&root.dir, &name)).await
    }

    async fn create(&self, owner: &OwnerId, draft: &E::Draft) -> Result<E, Error> {
        let id = EntityId::canonical(Uuid::new_v4().to_string());
        let entity = E::from_draft(id, owner.clone(), draft, self.clock.utc());
        let stored = entity.clone();
        self.modify(owner, move |entities| {
            entities.push(stored);
            Ok(((), true))
        })
        .await?;
        debug!(collection = E::COLLECTION, id = %entity.id(), "entity stored");
        Ok(entity)
    }

    async fn update(&self, owner: &OwnerId, id: &EntityId, patch: &E::Patch) -> Result<E, Error> {
        let id = id.clone();
        let patch = patch.clone();
        self.modify(owner, move |entities| {
            let entity = entities
                .iter_mut()
                .find(|entity| entity.id() == &id)
                .ok_or_else(|| Error::not_found(&id))?;
            entity.apply_patch(&patch);
            Ok((entity.clone(), true))
        })
        .await
    }

    async fn delete(&self, owner: &OwnerId, id: &EntityId) -> Result<(), Error> {
        let id = id.clone();
        self.modify(owner, move |entities| {
            let before = entities.len();
            entities.retain(|entity| entity.id() != &id);
            if entities.len() == before {
                return Err(Error::not_found(&id));
            }
            Ok(((), true))
        })
        .await
    }
}

/// File name of the document holding `collection` for `owner`.
fn document_name(collection: &str, owner: &OwnerId) -> String {
    let digest = Sha256::digest(owner.as_ref().as_bytes());
    format!("{collection}-{}.json", hex::encode(digest))
}

fn read_document<E: DeserializeOwned>(dir: &Dir, name: &str) -> Result<Vec<E>, Error> {
    let contents = match dir.read_to_string(name) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(Error::unknown(format!(
                "failed to read embedded document {name}: {err}"
            )));
        }
    };
    let document: StoredDocument<E> = serde_json::from_str(&contents).map_err(|err| {
        Error::unknown(format!("embedded document {name} is corrupt: {err}"))
    })?;
    if document.version != DOCUMENT_VERSION {
        return Err(Error::unknown(format!(
            "embedded document {name} has unsupported version {}",
            document.version
        )));
    }
    Ok(document.entities)
}

fn write_document<E: Serialize>(
    dir: &Dir,
    name: &str,
    quota: StoreQuota,
    entities: Vec<E>,
) -> Result<(), Error> {
    let document = StoredDocument {
        version: DOCUMENT_VERSION,
        entities,
    };
    let contents = serde_json::to_vec(&document)
        .map_err(|err| Error::unknown(format!("failed to encode embedded document: {err}")))?;
    let len = u64::try_from(contents.len()).unwrap_or(u64::MAX);
    quota.check(dir, name, len)?;
    atomic_io::write_atomic(dir, name, &contents)
        .map_err(|err| Error::unknown(format!("failed to write embedded document {name}: {err}")))
}

async fn run_blocking<R, F>(work: F) -> Result<R, Error>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| Error::unknown(format!("embedded store task failed: {err}")))?
}

#[cfg(test)]
mod tests;
