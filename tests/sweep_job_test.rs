//! Integration tests for the scheduled sweep jobs.

mod helpers;

use std::sync::Arc;

use chrono::Duration;

use helpers::TestApp;
use termhub_core::traits::Clock;
use termhub_core::types::id::UserId;
use termhub_entity::term::TermStatus;
use termhub_worker::jobs::{
    EXPIRE_SWEEP, ExpireSweepJobHandler, REMINDER_SWEEP, ReminderSweepJobHandler,
};
use termhub_worker::{JobExecutor, JobRun};

fn executor(app: &TestApp) -> JobExecutor {
    let clock: Arc<dyn Clock> = app.clock.clone();
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(ExpireSweepJobHandler::new(
        Arc::clone(&app.services.lifecycle),
        Arc::clone(&clock),
    )));
    executor.register(Arc::new(ReminderSweepJobHandler::new(
        Arc::clone(&app.services.lifecycle),
        clock,
    )));
    executor
}

#[tokio::test]
async fn test_daily_runs_remind_then_expire() {
    let app = TestApp::new();
    let executor = executor(&app);
    let template = app.create_template("v1", true).await;
    let teacher = UserId::new();
    let term = app.sign(teacher, template.id).await;

    app.clock.set(term.expiration_date - Duration::days(20));
    let summary = executor
        .execute(&JobRun::new(REMINDER_SWEEP, app.clock.now()))
        .await
        .unwrap()
        .expect("job should run");
    assert_eq!(summary["sent"], 1);

    let summary = executor
        .execute(&JobRun::new(EXPIRE_SWEEP, app.clock.now()))
        .await
        .unwrap()
        .expect("job should run");
    assert_eq!(summary["transitioned"], 0);

    app.clock.set(term.expiration_date + Duration::hours(1));
    let summary = executor
        .execute(&JobRun::new(EXPIRE_SWEEP, app.clock.now()))
        .await
        .unwrap()
        .expect("job should run");
    assert_eq!(summary["transitioned"], 1);

    let term = app.services.lifecycle.get_term(term.id).await.unwrap();
    assert_eq!(term.status, TermStatus::Expired);
    assert!(term.reminder_sent);
    assert!(
        app.services
            .lifecycle
            .get_active_term(teacher)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_reminder_window_comes_from_config() {
    let app = TestApp::new();
    let executor = executor(&app);
    let template = app.create_template("v1", true).await;
    let term = app.sign(UserId::new(), template.id).await;

    let window = Duration::days(app.config.terms.reminder_window_days);
    app.clock.set(term.expiration_date - window - Duration::days(1));
    let summary = executor
        .execute(&JobRun::new(REMINDER_SWEEP, app.clock.now()))
        .await
        .unwrap()
        .expect("job should run");
    assert_eq!(summary["sent"], 0);

    app.clock.advance(Duration::days(2));
    let summary = executor
        .execute(&JobRun::new(REMINDER_SWEEP, app.clock.now()))
        .await
        .unwrap()
        .expect("job should run");
    assert_eq!(summary["sent"], 1);
}

#[test]
fn test_both_sweeps_registered() {
    let app = TestApp::new();
    let executor = executor(&app);
    assert!(executor.has_handler(EXPIRE_SWEEP));
    assert!(executor.has_handler(REMINDER_SWEEP));
}
