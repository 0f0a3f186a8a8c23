//! Outbound notifications sent after administrative actions.

use std::sync::Mutex;

use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Sent to a newly created user.
    Welcome {
        username: String,
        email: String,
    },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::Welcome { email, .. } => email,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notification::Welcome { username, .. } => format!("Welcome, {username}"),
        }
    }
}

/// Delivery channel for [`Notification`]s. Failures are reported with
/// [`CoreError::Notification`] and never abort the calling operation.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), CoreError>;
}

/// Writes notifications to the tracing log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), CoreError> {
        tracing::info!(
            to = notification.recipient(),
            subject = %notification.subject(),
            "notification queued"
        );
        Ok(())
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), CoreError> {
        self.sent
            .lock()
            .map_err(|_| CoreError::Notification("outbox lock poisoned".into()))?
            .push(notification.clone());
        Ok(())
    }
}
