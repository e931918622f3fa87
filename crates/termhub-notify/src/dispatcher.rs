//! Notification dispatcher: in-app persistence plus best-effort channel
//! delivery.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use termhub_core::error::AppError;
use termhub_core::result::AppResult;
use termhub_core::traits::Clock;
use termhub_core::types::id::{NotificationId, UserId};
use termhub_database::{ChannelTargetDirectory, NotificationStorage};
use termhub_entity::notification::{ChannelKind, InAppNotification, NotificationRequest};

use crate::channel::{ChannelAdapter, ChannelError};
use crate::policy;

/// What happened on one external channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// The adapter accepted the message.
    Delivered,
    /// No address for this user on the channel.
    Skipped {
        /// Why the channel was not used.
        reason: String,
    },
    /// The adapter failed or timed out.
    Failed {
        /// Error description.
        error: String,
    },
}

/// Outcome of one adapter for one notification.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDelivery {
    /// Adapter name.
    pub channel: String,
    /// Adapter medium.
    pub kind: ChannelKind,
    /// Result of the attempt.
    pub outcome: ChannelOutcome,
}

/// Result of dispatching one notification.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// Id of the stored in-app notification.
    pub notification_id: NotificationId,
    /// One entry per eligible adapter.
    pub channels: Vec<ChannelDelivery>,
}

impl DispatchReport {
    /// Number of adapters that accepted the message.
    pub fn delivered_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| c.outcome == ChannelOutcome::Delivered)
            .count()
    }

    /// Number of adapters that failed.
    pub fn failed_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| matches!(c.outcome, ChannelOutcome::Failed { .. }))
            .count()
    }
}

/// Result of fanning one notification out to several users.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MultiDispatchReport {
    /// Users whose in-app notification was stored.
    pub sent: usize,
    /// Users whose dispatch failed.
    pub failed: usize,
    /// Reports for the successful users.
    pub reports: Vec<DispatchReport>,
    /// Failed users with the error message.
    pub failures: Vec<(UserId, String)>,
}

/// Routes notifications to the in-app inbox and the external channels
/// their priority calls for.
#[derive(Debug)]
pub struct NotificationDispatcher {
    storage: Arc<dyn NotificationStorage>,
    directory: Arc<dyn ChannelTargetDirectory>,
    adapters: Vec<Arc<dyn ChannelAdapter>>,
    channel_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl NotificationDispatcher {
    /// Create a dispatcher with no external adapters.
    pub fn new(
        storage: Arc<dyn NotificationStorage>,
        directory: Arc<dyn ChannelTargetDirectory>,
        clock: Arc<dyn Clock>,
        channel_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            directory,
            adapters: Vec::new(),
            channel_timeout,
            clock,
        }
    }

    /// Register an external channel adapter.
    pub fn with_adapter(mut self, adapter: Arc<dyn ChannelAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Register several adapters.
    pub fn with_adapters(mut self, adapters: impl IntoIterator<Item = Arc<dyn ChannelAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    /// Store the in-app notification and forward to eligible channels.
    ///
    /// Channel failures end up in the report. An error is returned only
    /// when the request is invalid or the in-app record could not be
    /// stored; channels are still attempted in the latter case.
    pub async fn send_notification(&self, request: NotificationRequest) -> AppResult<DispatchReport> {
        if request.title.trim().is_empty() {
            return Err(AppError::validation("notification title must not be empty"));
        }
        if request.message.trim().is_empty() {
            return Err(AppError::validation("notification message must not be empty"));
        }

        let notification = InAppNotification::from_request(&request, self.clock.now());
        let stored = self.storage.insert(&notification).await;
        if let Err(e) = &stored {
            error!(
                user_id = %request.user_id,
                event_type = %request.event_type,
                error = %e,
                "Failed to store in-app notification"
            );
        }

        let channels = self.deliver_to_channels(&request).await;

        stored?;
        info!(
            notification_id = %notification.id,
            user_id = %request.user_id,
            event_type = %request.event_type,
            priority = %request.priority,
            channels = channels.len(),
            "Notification dispatched"
        );
        Ok(DispatchReport {
            notification_id: notification.id,
            channels,
        })
    }

    /// Dispatch the same notification to each user in turn.
    ///
    /// `request.user_id` is replaced by each entry of `user_ids`. A failure
    /// for one user is logged and counted; the rest still get theirs.
    pub async fn send_to_multiple(
        &self,
        user_ids: &[UserId],
        request: &NotificationRequest,
    ) -> MultiDispatchReport {
        let mut report = MultiDispatchReport::default();
        for &user_id in user_ids {
            match self.send_notification(request.for_user(user_id)).await {
                Ok(single) => {
                    report.sent += 1;
                    report.reports.push(single);
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Notification to user failed");
                    report.failed += 1;
                    report.failures.push((user_id, e.to_string()));
                }
            }
        }
        report
    }

    /// Notifications of a user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<InAppNotification>> {
        self.storage.list_for_user(user_id, unread_only, limit).await
    }

    /// Number of unread notifications of a user.
    pub async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        self.storage.count_unread(user_id).await
    }

    /// Mark one of the user's notifications read.
    pub async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<()> {
        if !self.storage.mark_read(id, user_id, self.clock.now()).await? {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }

    /// Mark all of the user's notifications read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        self.storage.mark_all_read(user_id, self.clock.now()).await
    }

    async fn deliver_to_channels(&self, request: &NotificationRequest) -> Vec<ChannelDelivery> {
        let eligible: Vec<&Arc<dyn ChannelAdapter>> = self
            .adapters
            .iter()
            .filter(|a| policy::is_eligible(request.priority, a.kind()))
            .collect();
        if eligible.is_empty() {
            return Vec::new();
        }

        let text = request.render_text();
        let mut deliveries = Vec::with_capacity(eligible.len());
        for adapter in eligible {
            let outcome = self.deliver_one(adapter.as_ref(), request.user_id, &text).await;
            deliveries.push(ChannelDelivery {
                channel: adapter.name().to_string(),
                kind: adapter.kind(),
                outcome,
            });
        }
        deliveries
    }

    async fn deliver_one(
        &self,
        adapter: &dyn ChannelAdapter,
        user_id: UserId,
        text: &str,
    ) -> ChannelOutcome {
        let registered = match self.directory.find_target(user_id, adapter.kind()).await {
            Ok(target) => target,
            Err(e) => {
                warn!(channel = adapter.name(), user_id = %user_id, error = %e, "Channel target lookup failed");
                return ChannelOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };
        let Some(target) = registered.or_else(|| adapter.default_target().map(str::to_string)) else {
            debug!(channel = adapter.name(), user_id = %user_id, "No channel target, skipping");
            return ChannelOutcome::Skipped {
                reason: "no target".to_string(),
            };
        };

        let result = match tokio::time::timeout(self.channel_timeout, adapter.send(&target, text)).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::Timeout),
        };
        match result {
            Ok(()) => ChannelOutcome::Delivered,
            Err(e) => {
                warn!(channel = adapter.name(), user_id = %user_id, error = %e, "Channel delivery failed");
                ChannelOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use termhub_core::error::ErrorKind;
    use termhub_core::traits::ManualClock;
    use termhub_database::MemoryStore;
    use termhub_entity::notification::NotificationPriority;

    #[derive(Debug)]
    enum Behaviour {
        Succeed,
        Fail,
        Hang,
    }

    #[derive(Debug)]
    struct MockChannel {
        kind: ChannelKind,
        behaviour: Behaviour,
        default_target: Option<String>,
        calls: AtomicUsize,
        targets: Mutex<Vec<String>>,
    }

    impl MockChannel {
        fn new(kind: ChannelKind, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                kind,
                behaviour,
                default_target: Some("fallback".into()),
                calls: AtomicUsize::new(0),
                targets: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChannelAdapter for MockChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn default_target(&self) -> Option<&str> {
            self.default_target.as_deref()
        }

        async fn send(&self, target: &str, _text: &str) -> Result<(), ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.targets.lock().unwrap().push(target.to_string());
            match self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::Fail => Err(ChannelError::Http("connection reset".into())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn dispatcher(store: &MemoryStore) -> NotificationDispatcher {
        NotificationDispatcher::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(ManualClock::new(t0())),
            Duration::from_secs(10),
        )
    }

    fn request(user: UserId, priority: NotificationPriority) -> NotificationRequest {
        NotificationRequest::new(user, "admin.message", "Title", "Body", priority)
    }

    #[tokio::test]
    async fn test_failing_channel_still_persists_in_app() {
        let store = MemoryStore::new();
        let chat = MockChannel::new(ChannelKind::Chat, Behaviour::Fail);
        let dispatcher = dispatcher(&store).with_adapter(chat.clone());
        let user = UserId::new();

        let report = dispatcher
            .send_notification(request(user, NotificationPriority::Urgent))
            .await
            .unwrap();

        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(dispatcher.unread_count(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_low_priority_is_in_app_only() {
        let store = MemoryStore::new();
        let chat = MockChannel::new(ChannelKind::Chat, Behaviour::Succeed);
        let email = MockChannel::new(ChannelKind::Email, Behaviour::Succeed);
        let dispatcher = dispatcher(&store)
            .with_adapter(chat.clone())
            .with_adapter(email.clone());

        let report = dispatcher
            .send_notification(request(UserId::new(), NotificationPriority::Low))
            .await
            .unwrap();

        assert!(report.channels.is_empty());
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
        assert_eq!(email.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_high_priority_uses_chat_and_email() {
        let store = MemoryStore::new();
        let chat = MockChannel::new(ChannelKind::Chat, Behaviour::Succeed);
        let email = MockChannel::new(ChannelKind::Email, Behaviour::Succeed);
        let dispatcher = dispatcher(&store)
            .with_adapter(chat.clone())
            .with_adapter(email.clone());

        let report = dispatcher
            .send_notification(request(UserId::new(), NotificationPriority::High))
            .await
            .unwrap();
        assert_eq!(report.delivered_count(), 2);
    }

    #[tokio::test]
    async fn test_registered_target_preferred_over_default() {
        let store = MemoryStore::new();
        let user = UserId::new();
        store
            .upsert_target(user, ChannelKind::Chat, "12345", t0())
            .await
            .unwrap();
        let chat = MockChannel::new(ChannelKind::Chat, Behaviour::Succeed);
        let dispatcher = dispatcher(&store).with_adapter(chat.clone());

        dispatcher
            .send_notification(request(user, NotificationPriority::Urgent))
            .await
            .unwrap();
        assert_eq!(*chat.targets.lock().unwrap(), vec!["12345".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_target_is_skipped() {
        let store = MemoryStore::new();
        let chat = Arc::new(MockChannel {
            kind: ChannelKind::Chat,
            behaviour: Behaviour::Succeed,
            default_target: None,
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        });
        let dispatcher = dispatcher(&store).with_adapter(chat.clone());

        let report = dispatcher
            .send_notification(request(UserId::new(), NotificationPriority::Urgent))
            .await
            .unwrap();
        assert!(matches!(report.channels[0].outcome, ChannelOutcome::Skipped { .. }));
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_channel_times_out() {
        let store = MemoryStore::new();
        let chat = MockChannel::new(ChannelKind::Chat, Behaviour::Hang);
        let dispatcher = dispatcher(&store).with_adapter(chat);
        let user = UserId::new();

        let report = dispatcher
            .send_notification(request(user, NotificationPriority::Urgent))
            .await
            .unwrap();

        assert_eq!(
            report.channels[0].outcome,
            ChannelOutcome::Failed {
                error: ChannelError::Timeout.to_string()
            }
        );
        assert_eq!(dispatcher.unread_count(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);
        let mut req = request(UserId::new(), NotificationPriority::Low);
        req.title = "   ".into();
        let err = dispatcher.send_notification(req).await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_send_to_multiple_counts_each_user() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);
        let users = [UserId::new(), UserId::new(), UserId::new()];

        let report = dispatcher
            .send_to_multiple(&users, &request(users[0], NotificationPriority::Medium))
            .await;
        assert_eq!(report.sent, 3);
        assert_eq!(report.failed, 0);
        for user in users {
            assert_eq!(dispatcher.unread_count(user).await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_inbox_read_tracking() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);
        let user = UserId::new();
        let first = dispatcher
            .send_notification(request(user, NotificationPriority::Low))
            .await
            .unwrap();
        dispatcher
            .send_notification(request(user, NotificationPriority::Low))
            .await
            .unwrap();

        let err = dispatcher
            .mark_read(first.notification_id, UserId::new())
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));

        dispatcher.mark_read(first.notification_id, user).await.unwrap();
        let unread = dispatcher.list_for_user(user, true, 50).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_ne!(unread[0].id, first.notification_id);

        assert_eq!(dispatcher.mark_all_read(user).await.unwrap(), 1);
        assert_eq!(dispatcher.unread_count(user).await.unwrap(), 0);
        assert_eq!(dispatcher.list_for_user(user, false, 50).await.unwrap().len(), 2);
    }
}
