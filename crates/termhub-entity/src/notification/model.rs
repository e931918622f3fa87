//! In-app notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use termhub_core::types::id::{NotificationId, UserId};

use super::data::NotificationData;
use super::priority::NotificationPriority;
use super::request::NotificationRequest;

/// A notification shown in the recipient's in-app inbox.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InAppNotification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Event type that triggered this notification.
    pub event_type: String,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Structured payload, stored as JSON.
    pub data: Option<Json<NotificationData>>,
    /// Link the UI should open.
    pub action_url: Option<String>,
    /// Whether the user has read this notification.
    pub read: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl InAppNotification {
    /// Build the unread inbox record for a request.
    pub fn from_request(request: &NotificationRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            user_id: request.user_id,
            title: request.title.clone(),
            message: request.message.clone(),
            event_type: request.event_type.clone(),
            priority: request.priority,
            data: request.data.clone().map(Json),
            action_url: request.action_url.clone(),
            read: false,
            read_at: None,
            created_at,
        }
    }

    /// The typed payload, if any.
    pub fn payload(&self) -> Option<&NotificationData> {
        self.data.as_ref().map(|json| &json.0)
    }
}
