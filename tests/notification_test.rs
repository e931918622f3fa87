//! Integration tests for notification fan-out.

mod helpers;

use std::sync::Arc;

use helpers::{RecordingChannel, TestApp};
use termhub_core::error::ErrorKind;
use termhub_core::traits::Clock;
use termhub_core::types::id::UserId;
use termhub_entity::notification::{ChannelKind, NotificationPriority};
use termhub_notify::{ChannelAdapter, ChannelOutcome, NotificationFormatter};

#[tokio::test]
async fn test_urgent_with_failing_channel_still_stored() {
    let chat = RecordingChannel::failing(ChannelKind::Chat);
    let app = TestApp::with_adapters(vec![chat.clone() as Arc<dyn ChannelAdapter>]);
    let user = UserId::new();

    let request = NotificationFormatter::admin_message(
        user,
        "Server maintenance",
        "Classrooms are offline tonight.",
        NotificationPriority::Urgent,
    );
    let report = app
        .services
        .dispatcher
        .send_notification(request)
        .await
        .expect("channel failure must not fail the dispatch");

    assert_eq!(chat.call_count(), 1);
    assert_eq!(report.delivered_count(), 0);
    assert_eq!(report.failed_count(), 1);
    assert!(matches!(report.channels[0].outcome, ChannelOutcome::Failed { .. }));

    let inbox = app.services.dispatcher.list_for_user(user, true, 10).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].id, report.notification_id);
    assert_eq!(inbox[0].priority, NotificationPriority::Urgent);
}

#[tokio::test]
async fn test_low_priority_stays_in_app() {
    let chat = RecordingChannel::new(ChannelKind::Chat);
    let email = RecordingChannel::new(ChannelKind::Email);
    let app = TestApp::with_adapters(vec![
        chat.clone() as Arc<dyn ChannelAdapter>,
        email.clone() as Arc<dyn ChannelAdapter>,
    ]);
    let user = UserId::new();

    let request =
        NotificationFormatter::admin_message(user, "FYI", "Nothing urgent.", NotificationPriority::Low);
    let report = app.services.dispatcher.send_notification(request).await.unwrap();

    assert!(report.channels.is_empty());
    assert_eq!(chat.call_count() + email.call_count(), 0);
    assert_eq!(app.services.dispatcher.unread_count(user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_registered_target_used_for_delivery() {
    let chat = RecordingChannel::new(ChannelKind::Chat);
    let app = TestApp::with_adapters(vec![chat.clone() as Arc<dyn ChannelAdapter>]);
    let user = UserId::new();

    app.services
        .directory
        .upsert_target(user, ChannelKind::Chat, "4242", app.clock.now())
        .await
        .unwrap();

    let request = NotificationFormatter::admin_message(
        user,
        "Action needed",
        "Please renew.",
        NotificationPriority::High,
    );
    let report = app.services.dispatcher.send_notification(request).await.unwrap();

    assert_eq!(report.delivered_count(), 1);
    let messages = chat.messages.lock().unwrap();
    assert_eq!(messages[0].0, "4242");
    assert!(messages[0].1.contains("Action needed"));
}

#[tokio::test]
async fn test_send_to_multiple_users() {
    let app = TestApp::new();
    let users = [UserId::new(), UserId::new(), UserId::new()];

    let request = NotificationFormatter::admin_message(
        users[0],
        "Welcome",
        "New school year.",
        NotificationPriority::Medium,
    );
    let report = app.services.dispatcher.send_to_multiple(&users, &request).await;

    assert_eq!(report.sent, 3);
    assert_eq!(report.failed, 0);
    for user in users {
        let inbox = app.services.dispatcher.list_for_user(user, false, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].user_id, user);
    }
}

#[tokio::test]
async fn test_mark_read_is_scoped_to_owner() {
    let app = TestApp::new();
    let owner = UserId::new();
    let request =
        NotificationFormatter::admin_message(owner, "Hi", "Hello.", NotificationPriority::Low);
    let report = app.services.dispatcher.send_notification(request).await.unwrap();

    let err = app
        .services
        .dispatcher
        .mark_read(report.notification_id, UserId::new())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));

    app.services
        .dispatcher
        .mark_read(report.notification_id, owner)
        .await
        .unwrap();
    assert_eq!(app.services.dispatcher.unread_count(owner).await.unwrap(), 0);
    assert_eq!(app.services.dispatcher.mark_all_read(owner).await.unwrap(), 0);
}

#[tokio::test]
async fn test_blank_title_rejected() {
    let app = TestApp::new();
    let request =
        NotificationFormatter::admin_message(UserId::new(), "  ", "Body", NotificationPriority::Low);

    let err = app.services.dispatcher.send_notification(request).await.unwrap_err();
    assert!(err.is(ErrorKind::Validation));
}
