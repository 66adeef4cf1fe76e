//! User-facing notification payloads.

use std::fmt;

use super::{Error, FailureKind};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Level used when a failure of `kind` reaches the user.
    ///
    /// Failures the user can wait out are warnings; everything else is an
    /// error.
    #[must_use]
    pub fn for_failure(kind: FailureKind) -> Self {
        match kind {
            FailureKind::NetworkTransient
            | FailureKind::RateLimited { .. }
            | FailureKind::Timeout => Self::Warning,
            _ => Self::Error,
        }
    }

    /// Lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message for the user, keyed by failure kind when it reports a failure.
///
/// # Examples
/// ```
/// use budget_sync::domain::{Error, Notification, NotificationLevel};
///
/// let note = Notification::failure(&Error::timeout("slow server"));
/// assert_eq!(note.level(), NotificationLevel::Warning);
/// assert!(note.kind().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    level: NotificationLevel,
    kind: Option<FailureKind>,
    message: String,
}

impl Notification {
    /// Confirmation that a change was stored.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            kind: None,
            message: message.into(),
        }
    }

    /// Message describing a terminal failure.
    pub fn failure(error: &Error) -> Self {
        let kind = error.kind();
        Self {
            level: NotificationLevel::for_failure(kind),
            kind: Some(kind),
            message: failure_message(kind),
        }
    }

    pub fn level(&self) -> NotificationLevel {
        self.level
    }

    /// Failure kind the notification is keyed by; `None` for successes.
    pub fn kind(&self) -> Option<FailureKind> {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn failure_message(kind: FailureKind) -> String {
    match kind {
        FailureKind::NetworkTransient => {
            "Connection problem. Check your network and try again.".to_owned()
        }
        FailureKind::RateLimited {
            retry_after: Some(wait),
        } => format!(
            "Too many requests. Try again in {} seconds.",
            wait.as_secs().max(1)
        ),
        FailureKind::RateLimited { retry_after: None } => {
            "Too many requests. Try again shortly.".to_owned()
        }
        FailureKind::Timeout => "The server took too long to respond.".to_owned(),
        FailureKind::ClientRequest { status: 401 } => {
            "You need to sign in before changing data.".to_owned()
        }
        FailureKind::ClientRequest { status: 404 } => "That item no longer exists.".to_owned(),
        FailureKind::ClientRequest { status: 409 } => {
            "That item is still being saved. Try again in a moment.".to_owned()
        }
        FailureKind::ClientRequest { .. } => "The request was rejected.".to_owned(),
        FailureKind::QuotaExceeded => {
            "Local storage is full. Remove some data and try again.".to_owned()
        }
        FailureKind::Unknown => "Something went wrong. Your change was not saved.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case(FailureKind::NetworkTransient, NotificationLevel::Warning)]
    #[case(FailureKind::RateLimited { retry_after: None }, NotificationLevel::Warning)]
    #[case(FailureKind::Timeout, NotificationLevel::Warning)]
    #[case(FailureKind::ClientRequest { status: 400 }, NotificationLevel::Error)]
    #[case(FailureKind::QuotaExceeded, NotificationLevel::Error)]
    #[case(FailureKind::Unknown, NotificationLevel::Error)]
    fn level_follows_failure_kind(#[case] kind: FailureKind, #[case] expected: NotificationLevel) {
        assert_eq!(NotificationLevel::for_failure(kind), expected);
    }

    #[test]
    fn rate_limit_message_mentions_the_wait() {
        let err = Error::rate_limited(Some(Duration::from_secs(30)), "slow down");
        let note = Notification::failure(&err);
        assert!(note.message().contains("30 seconds"), "{}", note.message());
    }

    #[test]
    fn success_has_no_kind() {
        let note = Notification::success("Transaction added");
        assert_eq!(note.level(), NotificationLevel::Success);
        assert_eq!(note.kind(), None);
    }
}
