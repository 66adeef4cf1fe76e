//! Terminal-failure reporting: one log entry, then one notification.

use std::sync::Arc;

use tracing::debug;

use super::ports::{FailureLogger, FailureRecord, Notifier};
use super::{Error, Notification};

/// Forwards terminal failures to the failure logger and the notifier.
///
/// Callers roll back optimistic state before reporting, so the user is never
/// shown a change the backend rejected. Errors from either collaborator are
/// discarded.
#[derive(Clone)]
pub struct FailureReporter {
    component: &'static str,
    logger: Arc<dyn FailureLogger>,
    notifier: Arc<dyn Notifier>,
}

impl FailureReporter {
    pub fn new(
        component: &'static str,
        logger: Arc<dyn FailureLogger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            component,
            logger,
            notifier,
        }
    }

    /// Log (unless already logged upstream) and notify once.
    ///
    /// Returns the error marked as logged.
    pub async fn report_failure(&self, action: &str, error: Error) -> Error {
        let error = if error.is_logged() {
            error
        } else {
            let record = FailureRecord::from_error(self.component, action, &error);
            let _ = self.logger.log_failure(&record).await;
            error.mark_logged()
        };
        if let Err(notify_error) = self.notifier.notify(&Notification::failure(&error)).await {
            debug!(error = %notify_error, action, "failure notification dropped");
        }
        error
    }

    /// Notify that a change was stored.
    pub async fn report_success(&self, message: impl Into<String>) {
        let message = message.into();
        if let Err(notify_error) = self.notifier.notify(&Notification::success(&message)).await {
            debug!(error = %notify_error, message, "success notification dropped");
        }
    }
}
