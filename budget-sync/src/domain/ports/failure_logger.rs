//! Driven port accepting structured failure records.

use async_trait::async_trait;

use crate::domain::{Error, FailureKind, TraceId};

use super::define_port_error;

/// One terminal failure, ready for a log sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Component that observed the failure, e.g. `transport`.
    pub component: String,
    /// Operation that failed, e.g. `POST /users/u1/transactions`.
    pub action: String,
    /// Trace identifier of the failing request, when one was sent.
    pub trace_id: Option<TraceId>,
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub cause: String,
}

impl FailureRecord {
    /// Build a record describing a domain error.
    pub fn from_error(
        component: impl Into<String>,
        action: impl Into<String>,
        error: &Error,
    ) -> Self {
        Self {
            component: component.into(),
            action: action.into(),
            trace_id: error.trace_id(),
            kind: error.kind(),
            cause: error.message().to_owned(),
        }
    }
}

define_port_error! {
    /// Errors raised by failure log sinks.
    pub enum FailureLogError {
        /// The sink rejected or could not store the record.
        Sink { message: String } => "failure log sink rejected record: {message}",
    }
}

/// Port for recording terminal failures.
///
/// Callers discard errors from this port; a broken log sink must never mask
/// the failure being logged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FailureLogger: Send + Sync {
    /// Record one failure.
    async fn log_failure(&self, record: &FailureRecord) -> Result<(), FailureLogError>;
}
