//! Driven port for user-facing notifications.

use async_trait::async_trait;

use crate::domain::Notification;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification sinks.
    pub enum NotifierError {
        /// Nobody is listening for notifications any more.
        Closed => "notification channel closed",
    }
}

/// Port that surfaces success, warning, and error messages to the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError>;
}
