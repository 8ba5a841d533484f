use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title shared by every export notification.
pub const EXPORT_TITLE: &str = "Export";
/// Message shown when an export attempt fails.
pub const EXPORT_FAILED: &str = "L'export a échoué";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Success => "Succès",
            Self::Warning => "Attention",
            Self::Error => "Erreur",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppNotification {
    pub id: String,
    pub notification_type: NotificationType,
    pub title: Option<String>,
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

impl AppNotification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_type,
            title: None,
            message: message.into(),
            read: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The single error notification raised for a failed export.
    pub fn export_failed(detail: &str) -> Self {
        let message = match detail.trim() {
            "" => EXPORT_FAILED.to_string(),
            d => format!("{EXPORT_FAILED} : {d}"),
        };
        Self::new(NotificationType::Error, message).with_title(EXPORT_TITLE)
    }

    /// Confirmation naming the saved file.
    pub fn export_saved(path: &Path) -> Self {
        Self::new(
            NotificationType::Success,
            format!("Fichier enregistré : {}", path.display()),
        )
        .with_title(EXPORT_TITLE)
    }
}

impl fmt::Display for AppNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "[{}] {title} : {}", self.notification_type.label(), self.message),
            None => write!(f, "[{}] {}", self.notification_type.label(), self.message),
        }
    }
}

/// In-memory notification store, newest first.
pub struct NotificationStore {
    notifications: Vec<AppNotification>,
    max_notifications: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: Vec::new(),
            max_notifications: 100,
        }
    }

    pub fn push(&mut self, notification: AppNotification) {
        self.notifications.insert(0, notification);
        if self.notifications.len() > self.max_notifications {
            self.notifications.truncate(self.max_notifications);
        }
    }

    pub fn latest(&self) -> Option<&AppNotification> {
        self.notifications.first()
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_notification() {
        let n = AppNotification::new(NotificationType::Info, "Test message");
        assert_eq!(n.message, "Test message");
        assert_eq!(n.notification_type, NotificationType::Info);
        assert!(!n.read);
        assert!(n.title.is_none());
    }

    #[test]
    fn export_failed_notification() {
        let n = AppNotification::export_failed("Fichier de données illisible.");
        assert_eq!(n.notification_type, NotificationType::Error);
        assert_eq!(n.title.as_deref(), Some("Export"));
        assert_eq!(n.message, "L'export a échoué : Fichier de données illisible.");
        assert_eq!(AppNotification::export_failed("").message, EXPORT_FAILED);
    }

    #[test]
    fn export_saved_notification() {
        let n = AppNotification::export_saved(Path::new("/tmp/recettes_2024-01-01.pdf"));
        assert_eq!(n.notification_type, NotificationType::Success);
        assert!(n.message.contains("recettes_2024-01-01.pdf"));
        assert_eq!(n.to_string(), format!("[Succès] Export : {}", n.message));
    }

    #[test]
    fn store_newest_first() {
        let mut store = NotificationStore::new();
        store.push(AppNotification::new(NotificationType::Info, "first"));
        store.push(AppNotification::new(NotificationType::Info, "second"));
        assert_eq!(store.notifications[1].message, "first");
        assert_eq!(store.latest().unwrap().message, "second");
    }

    #[test]
    fn store_truncates_at_max() {
        let mut store = NotificationStore::new();
        store.max_notifications = 3;

        for i in 0..5 {
            store.push(AppNotification::new(NotificationType::Info, format!("msg{i}")));
        }
        assert_eq!(store.notifications.len(), 3);
        assert_eq!(store.latest().unwrap().message, "msg4");
    }

    #[test]
    fn store_latest_empty() {
        assert!(NotificationStore::new().latest().is_none());
    }

    #[test]
    fn notification_serde_roundtrip() {
        let n = AppNotification::new(NotificationType::Warning, "test").with_title("Title");
        let json = serde_json::to_string(&n).unwrap();
        let parsed: AppNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.message, "test");
        assert_eq!(parsed.title.as_deref(), Some("Title"));
        assert_eq!(parsed.notification_type, NotificationType::Warning);
    }
}
