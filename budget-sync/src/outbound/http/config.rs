//! Per-request configuration for [`super::HttpTransport::request`].

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Upper-case verb as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether an `Idempotency-Key` may be attached.
    #[must_use]
    pub fn accepts_idempotency_key(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the delay curve between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// `2^retry` seconds.
    Exponential,
    /// `retry + 1` seconds.
    Linear,
}

/// Retry behaviour for transient failures.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use budget_sync::outbound::http::{Backoff, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.base_delay(0), Duration::from_secs(1));
/// assert_eq!(policy.base_delay(3), Duration::from_secs(8));
/// assert_eq!(policy.base_delay(10), Duration::from_secs(32));
///
/// let linear = RetryPolicy { backoff: Backoff::Linear, ..policy };
/// assert_eq!(linear.base_delay(2), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay curve.
    pub backoff: Backoff,
    /// Upper bound of the computed delay, before jitter.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based), capped at `max_delay`.
    #[must_use]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let seconds = match self.backoff {
            Backoff::Exponential => 2_u64.checked_pow(retry).unwrap_or(u64::MAX),
            Backoff::Linear => u64::from(retry).saturating_add(1),
        };
        Duration::from_secs(seconds).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Backoff::Exponential,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Everything about a request except its URL.
///
/// The serialised form is part of the GET coalescing key, so two configs
/// that serialise identically are treated as the same request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestConfig {
    pub method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    /// Attach a stable `Idempotency-Key` to POST/PUT/PATCH.
    pub idempotent: bool,
    /// Per-attempt deadline; the transport default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    fn with_method(method: HttpMethod, body: Option<Value>) -> Self {
        Self {
            method,
            body,
            retry: None,
            idempotent: false,
            timeout: None,
        }
    }

    pub fn get() -> Self {
        Self::with_method(HttpMethod::Get, None)
    }

    pub fn post(body: Value) -> Self {
        Self::with_method(HttpMethod::Post, Some(body))
    }

    pub fn put(body: Value) -> Self {
        Self::with_method(HttpMethod::Put, Some(body))
    }

    pub fn patch(body: Value) -> Self {
        Self::with_method(HttpMethod::Patch, Some(body))
    }

    pub fn delete() -> Self {
        Self::with_method(HttpMethod::Delete, None)
    }

    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    #[must_use]
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
