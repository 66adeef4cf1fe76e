//! Transport failure types and their mapping into the domain taxonomy.

use std::time::Duration;

use crate::domain::ports::define_port_error;
use crate::domain::{Error, TraceId};

define_port_error! {
    /// Cause of one failed attempt, or of a failed request overall.
    pub enum TransportError {
        /// Connection, DNS, or I/O failure before a status was received.
        Network { message: String } => "network failure: {message}",
        /// HTTP 5xx.
        Server { status: u16 } => "server responded with status {status}",
        /// HTTP 429.
        RateLimited { retry_after: Option<Duration> } =>
            "rate limited by server (retry after {retry_after:?})",
        /// HTTP 4xx other than 429.
        Client { status: u16, message: String } =>
            "request rejected with status {status}: {message}",
        /// A status outside 2xx, 4xx, and 5xx.
        UnexpectedStatus { status: u16 } => "unexpected response status {status}",
        /// The attempt exceeded its deadline.
        Timeout { timeout: Duration } => "attempt timed out after {timeout:?}",
        /// A successful response body did not match the expected shape.
        Decode { message: String } => "response could not be decoded: {message}",
        /// The request could not be assembled.
        InvalidRequest { message: String } => "request could not be built: {message}",
        /// Every permitted attempt failed with a retryable cause.
        Exhausted { attempts: u32, last: Box<TransportError> } =>
            "gave up after {attempts} attempts: {last}",
    }
}

impl TransportError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Server { .. } | Self::RateLimited { .. }
        )
    }
}

/// Terminal failure of one logical request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request {trace_id} failed after {attempts} attempt(s): {error}")]
pub struct RequestFailure {
    /// Trace id shared by every attempt.
    pub trace_id: TraceId,
    /// Attempts made, the first included.
    pub attempts: u32,
    pub error: TransportError,
    /// Whether the failure logger has already seen this failure.
    pub logged: bool,
}

impl From<RequestFailure> for Error {
    fn from(failure: RequestFailure) -> Self {
        let message = failure.error.to_string();
        let error = match failure.error {
            TransportError::Exhausted { last, .. } => match *last {
                TransportError::RateLimited { retry_after } => {
                    Error::rate_limited(retry_after, message)
                }
                _ => Error::unknown(message),
            },
            TransportError::Network { .. } | TransportError::Server { .. } => {
                Error::network_transient(message)
            }
            TransportError::RateLimited { retry_after } => Error::rate_limited(retry_after, message),
            TransportError::Client { status, .. } => Error::client_request(status, message),
            TransportError::Timeout { .. } => Error::timeout(message),
            TransportError::UnexpectedStatus { .. }
            | TransportError::Decode { .. }
            | TransportError::InvalidRequest { .. } => Error::unknown(message),
        };
        let error = error.with_trace_id(failure.trace_id);
        if failure.logged {
            error.mark_logged()
        } else {
            error
        }
    }
}
