//! Shared handler state: the service trait objects plus the optional
//! infrastructure handles the health check and rate limiter need.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database, Mailer};
use crate::services::{
    AuthService, EnergyService, InventoryService, RewardsService, ServiceContainer, Services,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub inventory_service: Arc<dyn InventoryService>,
    pub rewards_service: Arc<dyn RewardsService>,
    pub energy_service: Arc<dyn EnergyService>,
    /// Redis cache; rate limiting is skipped without it
    pub cache: Option<Arc<Cache>>,
    /// Database handle used by the health check
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// Create application state from database connection and config.
    pub fn from_config(
        database: Arc<Database>,
        cache: Option<Arc<Cache>>,
        config: Config,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let container = Services::from_connection(database.get_connection(), config, mailer);

        Self::from_container(&container)
            .with_database(database)
            .with_cache(cache)
    }

    /// Create application state from any service container, without
    /// infrastructure handles.
    pub fn from_container(container: &dyn ServiceContainer) -> Self {
        Self {
            auth_service: container.auth(),
            inventory_service: container.inventory(),
            rewards_service: container.rewards(),
            energy_service: container.energy(),
            cache: None,
            database: None,
        }
    }

    pub fn with_cache(mut self, cache: Option<Arc<Cache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_database(mut self, database: Arc<Database>) -> Self {
        self.database = Some(database);
        self
    }
}
