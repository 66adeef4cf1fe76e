//! Failure logger that writes structured `tracing` events.

use async_trait::async_trait;
use tracing::error;

use crate::domain::ports::{FailureLogError, FailureLogger, FailureRecord};

/// Emits one `error!` event per terminal failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureLogger;

#[async_trait]
impl FailureLogger for TracingFailureLogger {
    async fn log_failure(&self, record: &FailureRecord) -> Result<(), FailureLogError> {
        let trace_id = record.trace_id.map(|id| id.to_string());
        error!(
            component = %record.component,
            action = %record.action,
            trace_id = trace_id.as_deref(),
            kind = record.kind.label(),
            cause = %record.cause,
            "operation failed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, TraceId};

    #[tokio::test]
    async fn never_fails() {
        let error = Error::timeout("slow").with_trace_id(TraceId::generate());
        let record = FailureRecord::from_error("transport", "GET /users/u1/transactions", &error);
        assert!(TracingFailureLogger.log_failure(&record).await.is_ok());
    }
}
