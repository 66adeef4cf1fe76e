//! Domain-level failure taxonomy.
//!
//! Every failure that leaves the synchronisation layer is classified into one
//! [`FailureKind`]. Adapters map their own errors into [`Error`]; the
//! coordinator and [`crate::domain::FailureReporter`] only ever look at the
//! kind, never at adapter-specific causes.

use std::fmt;
use std::time::Duration;

use super::TraceId;

/// Classification of a terminal or retry-eligible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FailureKind {
    /// Network-level failure or HTTP 5xx.
    NetworkTransient,
    /// HTTP 429, optionally with the server's `Retry-After` hint.
    RateLimited {
        /// Server-supplied wait before retrying.
        retry_after: Option<Duration>,
    },
    /// A single attempt exceeded its deadline.
    Timeout,
    /// HTTP 4xx other than 429, or a request rejected before sending.
    ClientRequest {
        /// Status code that describes the rejection.
        status: u16,
    },
    /// The embedded store is at or near its configured capacity.
    QuotaExceeded,
    /// Anything else, including exhausted retries.
    Unknown,
}

impl FailureKind {
    /// Whether the transport retries this kind internally.
    ///
    /// # Examples
    /// ```
    /// use budget_sync::domain::FailureKind;
    ///
    /// assert!(FailureKind::NetworkTransient.is_retryable());
    /// assert!(!FailureKind::Timeout.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkTransient | Self::RateLimited { .. })
    }

    /// Stable snake-case label used in log fields and notification keys.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NetworkTransient => "network_transient",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout => "timeout",
            Self::ClientRequest { .. } => "client_request",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is never empty; blank input is replaced by the kind label.
/// - `logged` is set once the failure has been forwarded to the failure
///   logger, so later layers do not log it again.
///
/// # Examples
/// ```
/// use budget_sync::domain::{Error, FailureKind};
///
/// let err = Error::client_request(404, "transaction not found");
/// assert_eq!(err.kind(), FailureKind::ClientRequest { status: 404 });
/// assert!(!err.is_logged());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: FailureKind,
    message: String,
    trace_id: Option<TraceId>,
    logged: bool,
}

impl Error {
    /// Create a new error of the given kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.label().to_owned()
        } else {
            message
        };
        Self {
            kind,
            message,
            trace_id: None,
            logged: false,
        }
    }

    /// Failure classification.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Human-readable cause.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Trace identifier of the request that failed, when one was sent.
    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    /// Whether the failure has already been forwarded to the failure logger.
    pub fn is_logged(&self) -> bool {
        self.logged
    }

    /// Attach the trace identifier of the failing request.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Mark the failure as already logged.
    #[must_use]
    pub fn mark_logged(mut self) -> Self {
        self.logged = true;
        self
    }

    /// Convenience constructor for [`FailureKind::NetworkTransient`].
    pub fn network_transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NetworkTransient, message)
    }

    /// Convenience constructor for [`FailureKind::RateLimited`].
    pub fn rate_limited(retry_after: Option<Duration>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::RateLimited { retry_after }, message)
    }

    /// Convenience constructor for [`FailureKind::Timeout`].
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    /// Convenience constructor for [`FailureKind::ClientRequest`].
    pub fn client_request(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::ClientRequest { status }, message)
    }

    /// Convenience constructor for [`FailureKind::QuotaExceeded`].
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(FailureKind::QuotaExceeded, message)
    }

    /// Convenience constructor for [`FailureKind::Unknown`].
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unknown, message)
    }

    /// Mutation attempted while no owner is signed in.
    pub fn no_active_owner() -> Self {
        Self::client_request(401, "no active owner; sign in before changing data")
    }

    /// Mutation addressed an id that is not in the local view.
    pub fn not_found(id: impl fmt::Display) -> Self {
        Self::client_request(404, format!("entity {id} not found"))
    }

    /// Mutation addressed an entity whose create has not been confirmed yet.
    pub fn not_yet_confirmed(id: impl fmt::Display) -> Self {
        Self::client_request(409, format!("entity {id} is still awaiting confirmation"))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FailureKind::NetworkTransient, true)]
    #[case(FailureKind::RateLimited { retry_after: Some(Duration::from_secs(2)) }, true)]
    #[case(FailureKind::Timeout, false)]
    #[case(FailureKind::ClientRequest { status: 400 }, false)]
    #[case(FailureKind::QuotaExceeded, false)]
    #[case(FailureKind::Unknown, false)]
    fn only_transient_kinds_are_retryable(#[case] kind: FailureKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }

    #[test]
    fn blank_messages_fall_back_to_the_kind_label() {
        let err = Error::new(FailureKind::Timeout, "   ");
        assert_eq!(err.message(), "timeout");
    }

    #[test]
    fn logged_marker_and_trace_id_are_carried() {
        let trace_id = TraceId::generate();
        let err = Error::unknown("boom").with_trace_id(trace_id).mark_logged();
        assert!(err.is_logged());
        assert_eq!(err.trace_id(), Some(trace_id));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn no_active_owner_is_a_client_error() {
        assert_eq!(
            Error::no_active_owner().kind(),
            FailureKind::ClientRequest { status: 401 }
        );
    }
}
