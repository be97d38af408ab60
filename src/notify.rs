//! Out-of-band notifications for the editor.
//!
//! Soft failures (a field that did not save, a locale list that could not be
//! loaded) never block the session. They are published here so the hosting
//! surface can show them as toasts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Publisher side of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Success, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Warning, message.into());
    }

    pub fn danger(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Danger, message.into());
    }

    fn publish(&self, level: NotificationLevel, message: String) {
        // No subscriber is fine: nobody is watching for toasts
        let _ = self.sender.send(Notification {
            level,
            message,
            at: Utc::now(),
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.danger("Could not save Hero Title");

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Danger);
        assert_eq!(notification.message, "Could not save Hero Title");
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        let notifier = Notifier::new();
        notifier.success("Translations saved");
        notifier.warning("No locales available");
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationLevel::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
    }
}
