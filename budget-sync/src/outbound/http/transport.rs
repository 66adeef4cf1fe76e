//! Resilient HTTP transport.
//!
//! One [`HttpTransport`] is built at startup and shared by cloning. It owns
//! the idempotency-key cache and the in-flight GET map, so independent
//! transports never share state.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use mockable::{Clock, DefaultClock};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::domain::idempotency::{IdempotencyConfig, IdempotencyKey};
use crate::domain::ports::{FailureLogger, FailureRecord};
use crate::domain::{Error, TraceId};

use super::in_flight::InFlight;
use super::{
    BackoffJitter, HttpExecutor, HttpMethod, OutgoingRequest, RandomJitter, RawResponse,
    RequestConfig, RequestFailure, RetryPolicy, RetrySleeper, TokioSleeper, TransportError,
};

/// Header carrying the per-request trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";
/// Header carrying the client clock in epoch milliseconds.
pub const CLIENT_TIMESTAMP_HEADER: &str = "x-client-timestamp";
/// Header carrying the idempotency key of a mutating request.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const COMPONENT: &str = "transport";

/// Tunables fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Per-attempt deadline when a request does not set its own.
    pub default_timeout: Duration,
    pub idempotency: IdempotencyConfig,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            idempotency: IdempotencyConfig::default(),
        }
    }
}

/// Runtime helpers used by the retry loop.
pub struct TransportRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
    /// Source of idempotency-key ages and client timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
}

impl Default for TransportRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
            clock: Arc::new(DefaultClock),
        }
    }
}

/// Successful response body plus the metadata needed to report a decode
/// failure against the right request.
#[derive(Debug, Clone)]
struct Delivered {
    trace_id: TraceId,
    attempts: u32,
    body: Arc<[u8]>,
}

type Outcome = Result<Delivered, RequestFailure>;

struct TransportInner {
    executor: Arc<dyn HttpExecutor>,
    logger: Arc<dyn FailureLogger>,
    runtime: TransportRuntime,
    default_timeout: Duration,
    idempotency: super::IdempotencyCache,
    in_flight: Arc<InFlight<Outcome>>,
}

/// HTTP client with retry, backoff, idempotency keys, GET coalescing,
/// per-attempt timeouts, and trace correlation.
///
/// Cloning is cheap; clones share caches.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<TransportInner>,
}

impl HttpTransport {
    pub fn new(
        executor: Arc<dyn HttpExecutor>,
        logger: Arc<dyn FailureLogger>,
        settings: TransportSettings,
        runtime: TransportRuntime,
    ) -> Self {
        Self {
            inner: Arc::new(TransportInner {
                executor,
                logger,
                runtime,
                default_timeout: settings.default_timeout,
                idempotency: super::IdempotencyCache::new(settings.idempotency),
                in_flight: Arc::new(InFlight::new()),
            }),
        }
    }

    /// Number of cached idempotency keys.
    pub fn idempotency_keys_cached(&self) -> usize {
        self.inner.idempotency.len()
    }

    /// Number of GET requests currently in flight.
    pub fn requests_in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Execute a request and decode its JSON response.
    ///
    /// An empty body decodes as `null`, so `()` works for bodiless replies.
    /// Terminal failures are logged once before they are returned.
    ///
    /// # Errors
    ///
    /// Returns [`RequestFailure`] once retries are exhausted or a terminal
    /// status, timeout, or decode failure occurs.
    pub async fn request<T: DeserializeOwned>(
        &self,
        url: &Url,
        config: &RequestConfig,
    ) -> Result<T, RequestFailure> {
        let delivered = if config.method == HttpMethod::Get {
            self.coalesced(url, config).await?
        } else {
            self.inner
                .execute_logged(url.clone(), config.clone())
                .await?
        };

        match decode(&delivered.body) {
            Ok(value) => Ok(value),
            Err(error) => {
                let failure = RequestFailure {
                    trace_id: delivered.trace_id,
                    attempts: delivered.attempts,
                    error,
                    logged: false,
                };
                Err(self.inner.log(url, config.method, failure).await)
            }
        }
    }

    async fn coalesced(&self, url: &Url, config: &RequestConfig) -> Outcome {
        let key = match serde_json::to_string(config) {
            Ok(serialised) => format!("{url} {serialised}"),
            Err(error) => {
                let failure = RequestFailure {
                    trace_id: TraceId::generate(),
                    attempts: 0,
                    error: TransportError::invalid_request(error.to_string()),
                    logged: false,
                };
                return Err(self.inner.log(url, config.method, failure).await);
            }
        };
        let inner = Arc::clone(&self.inner);
        let url = url.clone();
        let config = config.clone();
        let shared = self.inner.in_flight.join_or_start(key, move || {
            async move { inner.execute_logged(url, config).await }.boxed()
        });
        shared.await
    }
}

impl TransportInner {
    async fn execute_logged(&self, url: Url, config: RequestConfig) -> Outcome {
        match self.execute_with_retries(&url, &config).await {
            Ok(delivered) => Ok(delivered),
            Err(failure) => Err(self.log(&url, config.method, failure).await),
        }
    }

    async fn execute_with_retries(&self, url: &Url, config: &RequestConfig) -> Outcome {
        let trace_id = TraceId::generate();
        let idempotency_key = self.idempotency_key(url, config).map_err(|error| RequestFailure {
            trace_id,
            attempts: 0,
            error,
            logged: false,
        })?;
        let policy = config.retry.unwrap_or_else(RetryPolicy::none);
        let timeout = config.timeout.unwrap_or(self.default_timeout);
        let max_attempts = policy.max_retries.saturating_add(1);

        let mut last_error = None;
        for attempt in 1..=max_attempts {
            let request = self.build_request(url, config, trace_id, idempotency_key.as_ref());
            match self.attempt(request, timeout).await {
                Ok(body) => {
                    debug!(%trace_id, attempt, method = %config.method, %url, "request succeeded");
                    return Ok(Delivered {
                        trace_id,
                        attempts: attempt,
                        body,
                    });
                }
                Err(error) if !error.is_retryable() => {
                    return Err(RequestFailure {
                        trace_id,
                        attempts: attempt,
                        error,
                        logged: false,
                    });
                }
                Err(error) => {
                    if attempt < max_attempts {
                        let delay = self.retry_delay(&policy, attempt - 1, &error);
                        warn!(
                            %trace_id,
                            attempt,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %error,
                            "retrying request"
                        );
                        self.runtime.sleeper.sleep(delay).await;
                    }
                    last_error = Some(error);
                }
            }
        }

        let last = last_error
            .unwrap_or_else(|| TransportError::invalid_request("no attempt was permitted"));
        Err(RequestFailure {
            trace_id,
            attempts: max_attempts,
            error: TransportError::exhausted(max_attempts, last),
            logged: false,
        })
    }

    /// Key reused by every attempt of one logical mutation.
    fn idempotency_key(
        &self,
        url: &Url,
        config: &RequestConfig,
    ) -> Result<Option<IdempotencyKey>, TransportError> {
        if !(config.idempotent && config.method.accepts_idempotency_key()) {
            return Ok(None);
        }
        let body = config.body.as_ref().unwrap_or(&Value::Null);
        self.idempotency
            .key_for(url, body, self.runtime.clock.utc())
            .map(Some)
            .map_err(|error| TransportError::invalid_request(error.to_string()))
    }

    fn build_request(
        &self,
        url: &Url,
        config: &RequestConfig,
        trace_id: TraceId,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> OutgoingRequest {
        let mut headers = vec![
            (TRACE_ID_HEADER, trace_id.to_string()),
            (
                CLIENT_TIMESTAMP_HEADER,
                self.runtime.clock.utc().timestamp_millis().to_string(),
            ),
        ];
        if let Some(key) = idempotency_key {
            headers.push((IDEMPOTENCY_KEY_HEADER, key.to_string()));
        }
        OutgoingRequest {
            method: config.method,
            url: url.clone(),
            headers,
            body: config.body.clone(),
        }
    }

    async fn attempt(
        &self,
        request: OutgoingRequest,
        timeout: Duration,
    ) -> Result<Arc<[u8]>, TransportError> {
        match tokio::time::timeout(timeout, self.executor.execute(request)).await {
            Err(_elapsed) => Err(TransportError::timeout(timeout)),
            Ok(Err(error)) => Err(error),
            Ok(Ok(response)) => classify(response),
        }
    }

    /// Server hint for 429s, otherwise the jittered backoff curve.
    fn retry_delay(&self, policy: &RetryPolicy, retry: u32, error: &TransportError) -> Duration {
        if let TransportError::RateLimited {
            retry_after: Some(retry_after),
        } = error
        {
            return *retry_after;
        }
        self.runtime
            .jitter
            .jittered_delay(policy.base_delay(retry), retry)
    }

    /// Forward a terminal failure to the logger once.
    async fn log(&self, url: &Url, method: HttpMethod, failure: RequestFailure) -> RequestFailure {
        if failure.logged {
            return failure;
        }
        let kind = Error::from(failure.clone()).kind();
        let record = FailureRecord {
            component: COMPONENT.to_owned(),
            action: format!("{method} {}", url.path()),
            trace_id: Some(failure.trace_id),
            kind,
            cause: failure.error.to_string(),
        };
        let _ = self.logger.log_failure(&record).await;
        RequestFailure {
            logged: true,
            ..failure
        }
    }
}

fn classify(response: RawResponse) -> Result<Arc<[u8]>, TransportError> {
    match response.status {
        200..=299 => Ok(Arc::from(response.body)),
        429 => Err(TransportError::rate_limited(response.retry_after)),
        400..=499 => Err(TransportError::client(
            response.status,
            String::from_utf8_lossy(&response.body).trim().to_owned(),
        )),
        500..=599 => Err(TransportError::server(response.status)),
        status => Err(TransportError::unexpected_status(status)),
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|error| TransportError::decode(error.to_string()))
}
