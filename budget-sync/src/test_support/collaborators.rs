//! Recording logger, notifier, and session doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::ports::{
    FailureLogError, FailureLogger, FailureRecord, Notifier, NotifierError, SessionProvider,
};
use crate::domain::{Notification, NotificationLevel, OwnerId};

/// Failure logger that keeps every record.
#[derive(Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<FailureRecord>>,
    broken: bool,
}

impl RecordingLogger {
    /// Logger that records and then reports a sink failure.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(_) => panic!("logger mutex"),
        }
    }
}

#[async_trait]
impl FailureLogger for RecordingLogger {
    async fn log_failure(&self, record: &FailureRecord) -> Result<(), FailureLogError> {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(_) => panic!("logger mutex"),
        }
        if self.broken {
            return Err(FailureLogError::sink("log sink offline"));
        }
        Ok(())
    }
}

/// Notifier that keeps every notification.
#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<Notification>>);

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        match self.0.lock() {
            Ok(notes) => notes.clone(),
            Err(_) => panic!("notifier mutex"),
        }
    }

    /// Notifications at `level`.
    pub fn at_level(&self, level: NotificationLevel) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|note| note.level() == level)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        match self.0.lock() {
            Ok(mut notes) => notes.push(notification.clone()),
            Err(_) => panic!("notifier mutex"),
        }
        Ok(())
    }
}

/// Session provider driven by the test.
pub struct RecordingSession {
    owner: watch::Sender<Option<OwnerId>>,
}

impl RecordingSession {
    pub fn new(owner: Option<OwnerId>) -> Self {
        let (owner, _) = watch::channel(owner);
        Self { owner }
    }

    pub fn sign_in(&self, owner: OwnerId) {
        self.owner.send_replace(Some(owner));
    }

    pub fn sign_out(&self) {
        self.owner.send_replace(None);
    }
}

impl SessionProvider for RecordingSession {
    fn current_owner(&self) -> Option<OwnerId> {
        self.owner.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<OwnerId>> {
        self.owner.subscribe()
    }
}
