// 🔔 Notifications - User-facing failure reports
// Fire-and-forget: a notifier that fails to deliver never escalates

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Callback attached to a notification button
pub type ActionHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Button shown with a notification (e.g. "Fetch again")
#[derive(Clone, Serialize)]
pub struct NotificationAction {
    pub label: String,
    pub icon: String,
    #[serde(skip)]
    pub handler: ActionHandler,
}

impl NotificationAction {
    pub fn new<F>(label: impl Into<String>, icon: impl Into<String>, handler: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        NotificationAction {
            label: label.into(),
            icon: icon.into(),
            handler: Arc::new(handler),
        }
    }

    /// Run the attached handler to completion
    pub async fn run(&self) {
        (self.handler)().await
    }
}

impl fmt::Debug for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationAction")
            .field("label", &self.label)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

/// A message for the notification area
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Show as a toast in addition to the notification list
    pub display: bool,
    pub created_at: DateTime<Utc>,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            display: true,
            created_at: Utc::now(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }
}

// ============================================================================
// NOTIFIERS
// ============================================================================

/// Notification collaborator
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let actions: Vec<&str> = notification.actions.iter().map(|a| a.label.as_str()).collect();
        tracing::warn!(
            id = %notification.id,
            title = %notification.title,
            actions = ?actions,
            "{}",
            notification.message
        );
    }
}

/// Notifications kept by a [`NotificationLog`] before the oldest are dropped
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 32;

/// Keeps recent notifications in memory so callers can list them and trigger actions
#[derive(Debug, Clone)]
pub struct NotificationLog {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl Default for NotificationLog {
    fn default() -> Self {
        NotificationLog::with_capacity(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationLog {
    pub fn new() -> Self {
        NotificationLog::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        NotificationLog {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn all(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> Option<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Remove a notification by id
    pub fn dismiss(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// Run the first action of a notification (the retry button)
    ///
    /// The notification is removed before its action runs; a retry that fails
    /// again reports through a fresh notification. Returns false when the
    /// notification or its action does not exist.
    pub async fn trigger(&self, id: &str) -> bool {
        let action = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let position = entries
                .iter()
                .position(|n| n.id == id && !n.actions.is_empty());
            position
                .and_then(|index| entries.remove(index))
                .and_then(|notification| notification.actions.into_iter().next())
        };

        match action {
            Some(action) => {
                action.run().await;
                true
            }
            None => false,
        }
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        tracing::warn!(id = %notification.id, title = %notification.title, "{}", notification.message);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(notification);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_notification_log_trigger() {
        let log = NotificationLog::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let notification = Notification::new("Failed", "backend offline").with_action(NotificationAction::new(
            "Fetch again",
            "refresh-line",
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            },
        ));
        let id = notification.id.clone();
        log.notify(notification);

        assert_eq!(log.len(), 1);
        assert!(log.trigger(&id).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Triggering consumes the notification
        assert!(log.is_empty());
        assert!(!log.trigger(&id).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(!log.trigger("missing").await);
    }

    #[tokio::test]
    async fn test_trigger_without_action_keeps_notification() {
        let log = NotificationLog::new();
        let notification = Notification::new("Title", "Message");
        let id = notification.id.clone();
        log.notify(notification);

        assert!(!log.trigger(&id).await);
        assert!(log.get(&id).is_some());
    }

    #[test]
    fn test_notification_log_drops_oldest_beyond_capacity() {
        let log = NotificationLog::with_capacity(2);
        for title in ["first", "second", "third"] {
            log.notify(Notification::new(title, "Message"));
        }

        let titles: Vec<String> = log.all().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["second".to_string(), "third".to_string()]);
    }

    #[test]
    fn test_notification_log_dismiss() {
        let log = NotificationLog::new();
        let notification = Notification::new("Title", "Message");
        let id = notification.id.clone();
        log.notify(notification);

        assert_eq!(log.latest().unwrap().title, "Title");
        assert!(log.dismiss(&id));
        assert!(!log.dismiss(&id));
        assert!(log.is_empty());
    }

    #[test]
    fn test_notification_serializes_without_handler() {
        let notification = Notification::new("Title", "Message")
            .with_action(NotificationAction::new("Retry", "refresh-line", || async {}.boxed()));

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["actions"][0]["label"], "Retry");
        assert!(value["actions"][0].get("handler").is_none());
        assert_eq!(value["display"], true);
    }

    #[test]
    fn test_tracing_notifier_accepts_notifications() {
        TracingNotifier.notify(Notification::new("Title", "Message"));
    }
}
