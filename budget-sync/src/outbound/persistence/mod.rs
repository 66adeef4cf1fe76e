//! Persistence backends behind the uniform [`crate::domain::ports::EntityBackend`]
//! contract.

pub mod embedded;
pub mod remote;
mod selector;

pub use embedded::{DEFAULT_QUOTA_BYTES, EmbeddedStore, EmbeddedStoreError, StoreQuota};
pub use remote::{RemoteApi, WireEntity};
pub use selector::{
    BackendConfig, BackendMode, SelectedBackend, SelectionError, UnknownBackendMode,
    select_backend,
};
