//! Startup selection between the embedded store and the remote API.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use mockable::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;

use crate::domain::ports::{EntityBackend, define_port_error};
use crate::domain::{EntityId, Error, OwnerId};
use crate::outbound::http::{HttpTransport, RetryPolicy};

use super::embedded::{EmbeddedStore, EmbeddedStoreError, StoreQuota};
use super::remote::{RemoteApi, WireEntity};

/// Which backend serves a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// Durable local store.
    #[default]
    Embedded,
    /// REST API over the resilient transport.
    Remote,
}

impl BackendMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("backend must be `embedded` or `remote`, got {0:?}")]
pub struct UnknownBackendMode(pub String);

impl FromStr for BackendMode {
    type Err = UnknownBackendMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedded" => Ok(Self::Embedded),
            "remote" => Ok(Self::Remote),
            _ => Err(UnknownBackendMode(s.to_owned())),
        }
    }
}

/// Resolved deployment configuration for backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub mode: BackendMode,
    pub store_dir: Utf8PathBuf,
    pub quota: StoreQuota,
    /// Required in remote mode.
    pub api_base_url: Option<Url>,
    pub retry: RetryPolicy,
}

define_port_error! {
    /// Errors raised while building the selected backend.
    pub enum SelectionError {
        /// Remote mode needs an API base URL.
        MissingBaseUrl => "remote backend selected but no API base URL is configured",
        /// The embedded store could not be opened.
        Store { message: String } => "{message}",
    }
}

impl From<EmbeddedStoreError> for SelectionError {
    fn from(err: EmbeddedStoreError) -> Self {
        Self::store(err.to_string())
    }
}

/// The backend chosen at startup; never switched afterwards.
pub enum SelectedBackend<E> {
    Embedded(EmbeddedStore<E>),
    Remote(RemoteApi<E>),
}

impl<E> SelectedBackend<E> {
    pub fn mode(&self) -> BackendMode {
        match self {
            Self::Embedded(_) => BackendMode::Embedded,
            Self::Remote(_) => BackendMode::Remote,
        }
    }
}

/// Build the backend `config` asks for.
///
/// # Errors
///
/// Fails when remote mode lacks a base URL or the store cannot be opened.
pub fn select_backend<E>(
    config: &BackendConfig,
    transport: &HttpTransport,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Result<SelectedBackend<E>, SelectionError>
where
    E: WireEntity + Serialize + DeserializeOwned,
{
    let selected = match config.mode {
        BackendMode::Embedded => SelectedBackend::Embedded(EmbeddedStore::open(
            &config.store_dir,
            config.quota,
            clock,
        )?),
        BackendMode::Remote => {
            let base_url = config
                .api_base_url
                .clone()
                .ok_or_else(SelectionError::missing_base_url)?;
            SelectedBackend::Remote(RemoteApi::new(transport.clone(), base_url, config.retry))
        }
    };
    info!(
        mode = %selected.mode(),
        collection = E::COLLECTION,
        "persistence backend selected"
    );
    Ok(selected)
}

#[async_trait]
impl<E> EntityBackend<E> for SelectedBackend<E>
where
    E: WireEntity + Serialize + DeserializeOwned,
{
    async fn get_all(&self, owner: &OwnerId) -> Result<Vec<E>, Error> {
        match self {
            Self::Embedded(store) => store.get_all(owner).await,
            Self::Remote(api) => api.get_all(owner).await,
        }
    }

    async fn create(&self, owner: &OwnerId, draft: &E::Draft) -> Result<E, Error> {
        match self {
            Self::Embedded(store) => store.create(owner, draft).await,
            Self::Remote(api) => api.create(owner, draft).await,
        }
    }

    async fn update(&self, owner: &OwnerId, id: &EntityId, patch: &E::Patch) -> Result<E, Error> {
        match self {
            Self::Embedded(store) => store.update(owner, id, patch).await,
            Self::Remote(api) => api.update(owner, id, patch).await,
        }
    }

    async fn delete(&self, owner: &OwnerId, id: &EntityId) -> Result<(), Error> {
        match self {
            Self::Embedded(store) => store.delete(owner, id).await,
            Self::Remote(api) => api.delete(owner, id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Transaction;
    use crate::outbound::http::{TransportRuntime, TransportSettings};
    use crate::test_support::{MutableClock, RecordingLogger, ScriptedExecutor, temp_store_dir};
    use rstest::rstest;

    fn transport() -> HttpTransport {
        HttpTransport::new(
            Arc::new(ScriptedExecutor::default()),
            Arc::new(RecordingLogger::default()),
            TransportSettings::default(),
            TransportRuntime::default(),
        )
    }

    fn config(mode: BackendMode, store_dir: Utf8PathBuf) -> BackendConfig {
        BackendConfig {
            mode,
            store_dir,
            quota: StoreQuota::default(),
            api_base_url: None,
            retry: RetryPolicy::default(),
        }
    }

    #[rstest]
    #[case("embedded", BackendMode::Embedded)]
    #[case(" Remote ", BackendMode::Remote)]
    fn parses_mode_names(#[case] raw: &str, #[case] expected: BackendMode) {
        assert_eq!(raw.parse::<BackendMode>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_modes() {
        assert!("indexeddb".parse::<BackendMode>().is_err());
    }

    #[test]
    fn embedded_mode_opens_the_store() {
        let tmp = temp_store_dir();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 path");

        let selected = select_backend::<Transaction>(
            &config(BackendMode::Embedded, dir),
            &transport(),
            Arc::new(MutableClock::fixed()),
        )
        .expect("embedded backend");

        assert_eq!(selected.mode(), BackendMode::Embedded);
    }

    #[test]
    fn remote_mode_requires_a_base_url() {
        let outcome = select_backend::<Transaction>(
            &config(BackendMode::Remote, Utf8PathBuf::from("unused")),
            &transport(),
            Arc::new(MutableClock::fixed()),
        );

        assert!(matches!(outcome, Err(SelectionError::MissingBaseUrl)));
    }

    #[test]
    fn remote_mode_uses_the_api() {
        let mut remote = config(BackendMode::Remote, Utf8PathBuf::from("unused"));
        remote.api_base_url = Some(Url::parse("https://api.example.test/").expect("url"));

        let selected = select_backend::<Transaction>(
            &remote,
            &transport(),
            Arc::new(MutableClock::fixed()),
        )
        .expect("remote backend");

        assert_eq!(selected.mode(), BackendMode::Remote);
    }
}
