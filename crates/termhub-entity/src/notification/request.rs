//! Ephemeral notification request.

use serde::{Deserialize, Serialize};

use termhub_core::types::id::UserId;

use super::data::NotificationData;
use super::priority::NotificationPriority;

/// A notification to deliver. Not persisted as such; the dispatcher turns
/// it into an in-app record and channel messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Recipient.
    pub user_id: UserId,
    /// Event type (see [`super::event`]).
    pub event_type: String,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Delivery priority.
    pub priority: NotificationPriority,
    /// Structured payload.
    pub data: Option<NotificationData>,
    /// Link the UI should open.
    pub action_url: Option<String>,
}

impl NotificationRequest {
    /// Create a request with no payload or link.
    pub fn new(
        user_id: UserId,
        event_type: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: NotificationPriority,
    ) -> Self {
        Self {
            user_id,
            event_type: event_type.into(),
            title: title.into(),
            message: message.into(),
            priority,
            data: None,
            action_url: None,
        }
    }

    /// Attach a structured payload.
    pub fn with_data(mut self, data: NotificationData) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a UI link.
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    /// Same request addressed to another user.
    pub fn for_user(&self, user_id: UserId) -> Self {
        Self {
            user_id,
            ..self.clone()
        }
    }

    /// Plain-text rendering used by external channels.
    pub fn render_text(&self) -> String {
        match &self.action_url {
            Some(url) => format!("{}\n\n{}\n\n{}", self.title, self.message, url),
            None => format!("{}\n\n{}", self.title, self.message),
        }
    }
}
