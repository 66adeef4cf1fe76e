//! Deployment configuration loaded via OrthoConfig.
//!
//! The backend name and store directory carry loader defaults; the remaining
//! fields are optional and their accessors fall back to defaults. The backend
//! mode is resolved once at startup and never changes for the life of the
//! process.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::idempotency::IdempotencyConfig;
use crate::outbound::http::{Backoff, RetryPolicy, TransportSettings};
use crate::outbound::persistence::{BackendConfig, BackendMode, StoreQuota, UnknownBackendMode};

const DEFAULT_STORE_DIR: &str = "./budget-data";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 32_000;

/// Errors raised while interpreting settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    UnknownBackend(#[from] UnknownBackendMode),
    #[error("invalid API base URL {url:?}: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("remote backend selected but BUDGET_SYNC_API_BASE_URL is not set")]
    MissingBaseUrl,
}

/// Configuration values for the synchronisation layer.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BUDGET_SYNC")]
pub struct SyncSettings {
    /// `embedded` (default) or `remote`.
    #[ortho_config(default = "embedded".to_owned())]
    pub backend: String,
    /// Root of the REST API; required in remote mode.
    pub api_base_url: Option<String>,
    /// Directory of the embedded store.
    #[ortho_config(default = DEFAULT_STORE_DIR.to_owned())]
    pub store_dir: String,
    /// Embedded store capacity in bytes.
    pub store_quota_bytes: Option<u64>,
    /// Per-attempt HTTP deadline in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Retries after the first attempt.
    pub max_retries: Option<u32>,
    /// Cap on the computed backoff delay in milliseconds.
    pub max_retry_delay_ms: Option<u64>,
    /// Lifetime of cached idempotency keys in hours.
    pub idempotency_ttl_hours: Option<u64>,
}

impl SyncSettings {
    /// Selected backend mode.
    ///
    /// # Errors
    ///
    /// Returns an error for names other than `embedded` and `remote`.
    pub fn backend_mode(&self) -> Result<BackendMode, SettingsError> {
        Ok(self.backend.parse()?)
    }

    /// Parsed API base URL, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL does not parse or cannot carry a path.
    pub fn api_base_url(&self) -> Result<Option<Url>, SettingsError> {
        let Some(raw) = self.api_base_url.as_deref() else {
            return Ok(None);
        };
        let invalid = |message: String| SettingsError::InvalidBaseUrl {
            url: raw.to_owned(),
            message,
        };
        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_owned()));
        }
        Ok(Some(url))
    }

    pub fn store_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.store_dir.as_str())
    }

    pub fn store_quota(&self) -> StoreQuota {
        self.store_quota_bytes
            .map_or_else(StoreQuota::default, StoreQuota::new)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
                .max(1),
        )
    }

    /// Exponential retry policy for remote calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            backoff: Backoff::Exponential,
            max_delay: Duration::from_millis(
                self.max_retry_delay_ms
                    .unwrap_or(DEFAULT_MAX_RETRY_DELAY_MS),
            ),
        }
    }

    pub fn idempotency(&self) -> IdempotencyConfig {
        IdempotencyConfig::from_hours(self.idempotency_ttl_hours)
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            default_timeout: self.request_timeout(),
            idempotency: self.idempotency(),
        }
    }

    /// Everything backend selection needs, validated.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown mode, a malformed URL, or remote mode
    /// without a URL.
    pub fn backend_config(&self) -> Result<BackendConfig, SettingsError> {
        let mode = self.backend_mode()?;
        let api_base_url = self.api_base_url()?;
        if mode == BackendMode::Remote && api_base_url.is_none() {
            return Err(SettingsError::MissingBaseUrl);
        }
        Ok(BackendConfig {
            mode,
            store_dir: self.store_dir(),
            quota: self.store_quota(),
            api_base_url,
            retry: self.retry_policy(),
        })
    }
}
