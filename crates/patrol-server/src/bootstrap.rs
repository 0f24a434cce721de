//! Build the running app from a single YAML config.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use patrol_channels::{LineDispatcher, LogDispatcher, MessageRouter};
use patrol_config::{load_config, ConfigError};
use patrol_core::dispatch::MessageDispatcher;
use patrol_core::registration::{InMemorySessionStore, RegistrationFlow};
use patrol_core::store::{
    EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore,
};
use patrol_core::types::Role;
use patrol_core::{AssignmentEngine, DirectoryService};
use patrol_stores::JsonStore;

/// Bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Running app bundle created from unified config.
pub struct PatrolApp {
    pub router: Arc<MessageRouter>,
    pub engine: Arc<AssignmentEngine>,
    pub daily_at: chrono::NaiveTime,
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();

fn init_tracing_if_needed(level: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

impl PatrolApp {
    /// Create a runnable app from a single `patrol.yaml`.
    pub async fn from_config_path(path: &Path) -> Result<Self, BootstrapError> {
        let config = load_config(path)?;
        init_tracing_if_needed(&config.observability.log_level);
        let daily_at = config.schedule.daily_time()?;

        let store = Arc::new(JsonStore::open(&config.store.data_dir)?);
        store.seed_factories(&config.seed.factories).await?;

        let users: Arc<dyn UserStore> = store.clone();
        let factories: Arc<dyn FactoryStore> = store.clone();
        let equipments: Arc<dyn EquipmentStore> = store.clone();
        let tasks: Arc<dyn TaskStore> = store.clone();

        let dispatcher: Arc<dyn MessageDispatcher> = if config.line.is_configured() {
            Arc::new(LineDispatcher::new(config.line.channel_access_token.clone()))
        } else {
            tracing::warn!("no LINE credentials configured; outbound messages go to the log");
            Arc::new(LogDispatcher)
        };

        let roles: Vec<Role> = config
            .registration
            .roles
            .iter()
            .cloned()
            .map(Role::from)
            .collect();

        let flow = RegistrationFlow::new(
            Arc::new(InMemorySessionStore::new()),
            users.clone(),
            factories.clone(),
            roles,
        );
        let directory = DirectoryService::new(factories.clone(), equipments.clone());

        let engine = Arc::new(AssignmentEngine::new(
            users.clone(),
            factories,
            equipments,
            tasks.clone(),
            dispatcher.clone(),
        ));
        let router = Arc::new(MessageRouter::new(
            flow, directory, users, tasks, dispatcher,
        ));

        tracing::info!(app = %config.app.name, data_dir = %config.store.data_dir, "patrol bootstrapped");
        Ok(Self {
            router,
            engine,
            daily_at,
        })
    }
}
