//! Notifier adapters.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::domain::ports::{Notifier, NotifierError};
use crate::domain::{Notification, NotificationLevel};

/// Writes notifications to the log at a matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        let kind = notification.kind().map(|kind| kind.label());
        match notification.level() {
            NotificationLevel::Success => info!(kind, "{}", notification.message()),
            NotificationLevel::Warning => warn!(kind, "{}", notification.message()),
            NotificationLevel::Error => error!(kind, "{}", notification.message()),
        }
        Ok(())
    }
}

/// Forwards notifications to a UI task over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Notifier plus the receiving end for the UI.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        self.sender
            .send(notification.clone())
            .map_err(|_| NotifierError::closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error;

    #[tokio::test]
    async fn channel_delivers_in_order_and_reports_closure() {
        let (notifier, mut receiver) = ChannelNotifier::channel();
        notifier
            .notify(&Notification::success("Transaction added"))
            .await
            .expect("open channel");
        notifier
            .notify(&Notification::failure(&Error::quota_exceeded("full")))
            .await
            .expect("open channel");

        let first = receiver.recv().await.expect("first");
        let second = receiver.recv().await.expect("second");
        assert_eq!(first.level(), NotificationLevel::Success);
        assert_eq!(second.level(), NotificationLevel::Error);

        drop(receiver);
        assert_eq!(
            notifier.notify(&Notification::success("late")).await,
            Err(NotifierError::Closed)
        );
    }

    #[tokio::test]
    async fn tracing_notifier_accepts_every_level() {
        for note in [
            Notification::success("ok"),
            Notification::failure(&Error::timeout("slow")),
            Notification::failure(&Error::unknown("boom")),
        ] {
            assert!(TracingNotifier.notify(&note).await.is_ok());
        }
    }
}
