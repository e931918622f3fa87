//! Seam between the term lifecycle and notification delivery.

use async_trait::async_trait;

use termhub_core::result::AppResult;
use termhub_entity::notification::NotificationRequest;

use crate::dispatcher::{DispatchReport, NotificationDispatcher};

/// Something that can deliver a notification request.
///
/// The lifecycle manager holds one of these instead of a concrete
/// dispatcher, so tests can record or fail deliveries.
#[async_trait]
pub trait NotificationSender: Send + Sync + std::fmt::Debug {
    /// Deliver one notification.
    async fn send_notification(&self, request: NotificationRequest) -> AppResult<DispatchReport>;
}

#[async_trait]
impl NotificationSender for NotificationDispatcher {
    async fn send_notification(&self, request: NotificationRequest) -> AppResult<DispatchReport> {
        NotificationDispatcher::send_notification(self, request).await
    }
}
