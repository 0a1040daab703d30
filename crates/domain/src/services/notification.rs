//! Notification sink for user-facing alerts.
//!
//! Delivery mechanics (push, email) live outside the engine. State
//! transitions hand a [`Notification`] to the sink and move on: delivery is
//! fire-and-forget and a failed send never rolls back the transition that
//! triggered it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a notification, used by clients for routing and badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Cleaning,
    Reservation,
    System,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Cleaning => write!(f, "cleaning"),
            NotificationKind::Reservation => write!(f, "reservation"),
            NotificationKind::System => write!(f, "system"),
        }
    }
}

/// A user-facing alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
            data: None,
        }
    }

    /// Attach a structured payload for the client to act on.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Fan-out sink for notifications.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification to each recipient. Best effort; implementors
    /// log failures instead of returning them.
    async fn notify(&self, user_ids: &[Uuid], notification: Notification);
}

/// Sink that only logs, for development and as a default.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, user_ids: &[Uuid], notification: Notification) {
        tracing::info!(
            recipients = user_ids.len(),
            kind = %notification.kind,
            title = %notification.title,
            "Would deliver notification"
        );
    }
}

/// Sink that records every send, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: tokio::sync::Mutex<Vec<(Vec<Uuid>, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in send order.
    pub async fn sent(&self) -> Vec<(Vec<Uuid>, Notification)> {
        self.sent.lock().await.clone()
    }

    /// Notifications addressed to the given user.
    pub async fn sent_to(&self, user_id: Uuid) -> Vec<Notification> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(recipients, _)| recipients.contains(&user_id))
            .map(|(_, notification)| notification.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, user_ids: &[Uuid], notification: Notification) {
        self.sent
            .lock()
            .await
            .push((user_ids.to_vec(), notification));
    }
}
