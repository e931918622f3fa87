//! Service graph wiring shared by the daemon and the CLI.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use termhub_core::config::AppConfig;
use termhub_core::result::AppResult;
use termhub_core::traits::Clock;
use termhub_database::repositories::{
    ChannelTargetRepository, NotificationRepository, TemplateRepository, TermHistoryRepository,
    TermRepository,
};
use termhub_database::{
    ChannelTargetDirectory, DatabasePool, HistoryStorage, MemoryStore, NotificationStorage,
    TemplateStorage, TermStorage,
};
use termhub_notify::{ChannelAdapter, NotificationDispatcher};
use termhub_notify::channel::build_adapters;

use crate::audit::AuditTrail;
use crate::template::TermTemplateStore;
use crate::term::TermLifecycleManager;

/// One implementation of every storage trait.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Template table.
    pub templates: Arc<dyn TemplateStorage>,
    /// Term table.
    pub terms: Arc<dyn TermStorage>,
    /// History table.
    pub history: Arc<dyn HistoryStorage>,
    /// Notification table.
    pub notifications: Arc<dyn NotificationStorage>,
    /// Channel target table.
    pub directory: Arc<dyn ChannelTargetDirectory>,
}

impl Backends {
    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            templates: Arc::new(TemplateRepository::new(pool.clone())),
            terms: Arc::new(TermRepository::new(pool.clone())),
            history: Arc::new(TermHistoryRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            directory: Arc::new(ChannelTargetRepository::new(pool)),
        }
    }

    /// Every table backed by the same in-memory store.
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            templates: Arc::new(store.clone()),
            terms: Arc::new(store.clone()),
            history: Arc::new(store.clone()),
            notifications: Arc::new(store.clone()),
            directory: Arc::new(store),
        }
    }
}

/// Fully wired services.
#[derive(Debug, Clone)]
pub struct Services {
    /// Template store.
    pub templates: Arc<TermTemplateStore>,
    /// Term lifecycle manager.
    pub lifecycle: Arc<TermLifecycleManager>,
    /// Audit trail.
    pub audit: AuditTrail,
    /// Notification dispatcher.
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Channel target directory.
    pub directory: Arc<dyn ChannelTargetDirectory>,
    /// Time source every service reads.
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Build the service graph over `backends`.
    ///
    /// Channel adapters are created from `config.notifications`.
    pub fn build(backends: Backends, config: &AppConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let adapters = build_adapters(&config.notifications)?;
        Ok(Self::with_adapters(backends, config, clock, adapters))
    }

    /// Build the service graph with an explicit set of channel adapters.
    pub fn with_adapters(
        backends: Backends,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        adapters: Vec<Arc<dyn ChannelAdapter>>,
    ) -> Self {
        info!(channels = adapters.len(), "Notification channels ready");

        let dispatcher = Arc::new(
            NotificationDispatcher::new(
                Arc::clone(&backends.notifications),
                Arc::clone(&backends.directory),
                Arc::clone(&clock),
                Duration::from_secs(config.notifications.channel_timeout_seconds),
            )
            .with_adapters(adapters),
        );

        let audit = AuditTrail::new(Arc::clone(&backends.history));
        let templates = Arc::new(TermTemplateStore::new(
            Arc::clone(&backends.templates),
            Arc::clone(&clock),
        ));
        let lifecycle = Arc::new(TermLifecycleManager::new(
            Arc::clone(&backends.templates),
            Arc::clone(&backends.terms),
            audit.clone(),
            Arc::clone(&dispatcher) as Arc<dyn termhub_notify::NotificationSender>,
            Arc::clone(&clock),
            config.terms.clone(),
        ));

        Self {
            templates,
            lifecycle,
            audit,
            dispatcher,
            directory: backends.directory,
            clock,
        }
    }
}
