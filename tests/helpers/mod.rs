//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use termhub_core::config::AppConfig;
use termhub_core::result::AppResult;
use termhub_core::traits::{Clock, ManualClock};
use termhub_core::types::id::{TemplateId, TermId, UserId};
use termhub_database::{MemoryStore, TermStorage};
use termhub_entity::history::NewHistoryEntry;
use termhub_entity::notification::ChannelKind;
use termhub_entity::template::{CreateTemplate, TermTemplate};
use termhub_entity::term::{NewTerm, SignatureType, TermStatus, VolunteerTerm};
use termhub_notify::{ChannelAdapter, ChannelError};
use termhub_service::{ActorContext, Backends, Services, SignRequest};

/// Start of every test timeline.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

/// Channel adapter that records what it was asked to send.
#[derive(Debug)]
pub struct RecordingChannel {
    kind: ChannelKind,
    fail: bool,
    pub calls: AtomicUsize,
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn new(kind: ChannelKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            fail: false,
            calls: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(kind: ChannelKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            fail: true,
            calls: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelAdapter for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn default_target(&self) -> Option<&str> {
        Some("ops-room")
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.messages
            .lock()
            .unwrap()
            .push((target.to_string(), text.to_string()));
        if self.fail {
            return Err(ChannelError::Unavailable("gateway down".into()));
        }
        Ok(())
    }
}

/// Term storage that hands control back to the runtime after every
/// active-term lookup, so concurrent signers interleave between the
/// lookup and the insert.
#[derive(Debug)]
pub struct YieldingTerms {
    inner: MemoryStore,
    pub insert_calls: AtomicUsize,
}

impl YieldingTerms {
    pub fn new(inner: MemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            insert_calls: AtomicUsize::new(0),
        })
    }

    pub fn insert_count(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TermStorage for YieldingTerms {
    async fn find_by_id(&self, id: TermId) -> AppResult<Option<VolunteerTerm>> {
        TermStorage::find_by_id(&self.inner, id).await
    }

    async fn find_active_by_teacher(&self, teacher_id: UserId) -> AppResult<Option<VolunteerTerm>> {
        let found = self.inner.find_active_by_teacher(teacher_id).await;
        tokio::task::yield_now().await;
        found
    }

    async fn list_by_teacher(&self, teacher_id: UserId) -> AppResult<Vec<VolunteerTerm>> {
        self.inner.list_by_teacher(teacher_id).await
    }

    async fn find_active_expired_before(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<VolunteerTerm>> {
        self.inner.find_active_expired_before(now).await
    }

    async fn find_active_expiring_by(
        &self,
        limit: DateTime<Utc>,
        unreminded_only: bool,
    ) -> AppResult<Vec<VolunteerTerm>> {
        self.inner.find_active_expiring_by(limit, unreminded_only).await
    }

    async fn insert_signed(&self, term: NewTerm, entry: NewHistoryEntry) -> AppResult<VolunteerTerm> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_signed(term, entry).await
    }

    async fn transition(
        &self,
        id: TermId,
        to: TermStatus,
        entry: NewHistoryEntry,
    ) -> AppResult<Option<VolunteerTerm>> {
        self.inner.transition(id, to, entry).await
    }

    async fn mark_reminded(&self, id: TermId, entry: NewHistoryEntry) -> AppResult<bool> {
        self.inner.mark_reminded(id, entry).await
    }
}

/// Test application over the in-memory backend and a manual clock
pub struct TestApp {
    pub services: Services,
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub config: AppConfig,
}

impl TestApp {
    /// Create an app with no external channels
    pub fn new() -> Self {
        Self::with_adapters(Vec::new())
    }

    /// Create an app delivering through `adapters`
    pub fn with_adapters(adapters: Vec<Arc<dyn ChannelAdapter>>) -> Self {
        let store = MemoryStore::new();
        Self::build(store.clone(), Backends::memory(store), adapters)
    }

    /// Create an app whose term storage yields after active-term lookups
    pub fn with_yielding_terms() -> (Self, Arc<YieldingTerms>) {
        let store = MemoryStore::new();
        let terms = YieldingTerms::new(store.clone());
        let mut backends = Backends::memory(store.clone());
        backends.terms = terms.clone() as Arc<dyn TermStorage>;
        (Self::build(store, backends, Vec::new()), terms)
    }

    fn build(
        store: MemoryStore,
        backends: Backends,
        adapters: Vec<Arc<dyn ChannelAdapter>>,
    ) -> Self {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://unused@localhost/termhub"

            [terms]
            validity_months = 12
            reminder_window_days = 30

            [worker]
            storage = "memory"
            "#,
        )
        .expect("test config should parse");

        let clock = Arc::new(ManualClock::new(t0()));
        let services = Services::with_adapters(
            backends,
            &config,
            Arc::clone(&clock) as Arc<dyn Clock>,
            adapters,
        );

        Self {
            services,
            store,
            clock,
            config,
        }
    }

    /// Create a template, optionally activating it
    pub async fn create_template(&self, version: &str, make_active: bool) -> TermTemplate {
        self.services
            .templates
            .create_template(CreateTemplate {
                title: "Volunteer Agreement".into(),
                content: format!("Terms of volunteer service, {version}."),
                version: version.into(),
                make_active,
                created_by: None,
            })
            .await
            .expect("template should be created")
    }

    /// Sign `template` for `teacher` from a browser
    pub async fn sign(&self, teacher: UserId, template: TemplateId) -> VolunteerTerm {
        self.services
            .lifecycle
            .sign(sign_request(teacher, template))
            .await
            .expect("sign should succeed")
    }
}

pub fn sign_request(teacher: UserId, template: TemplateId) -> SignRequest {
    let ctx = ActorContext::user(teacher)
        .with_ip("203.0.113.7")
        .with_device("Mozilla/5.0");
    SignRequest::new(teacher, template, &ctx, SignatureType::Electronic)
}
