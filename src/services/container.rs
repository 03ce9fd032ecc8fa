//! Service container: the four services the HTTP layer and the background
//! workers share.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, EnergyAnalytics, EnergyService, InventoryManager,
    InventoryService, RewardsManager, RewardsService,
};
use crate::config::Config;
use crate::domain::PricingEngine;
use crate::infra::{Mailer, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn inventory(&self) -> Arc<dyn InventoryService>;

    fn rewards(&self) -> Arc<dyn RewardsService>;

    fn energy(&self) -> Arc<dyn EnergyService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    inventory_service: Arc<dyn InventoryService>,
    rewards_service: Arc<dyn RewardsService>,
    energy_service: Arc<dyn EnergyService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        inventory_service: Arc<dyn InventoryService>,
        rewards_service: Arc<dyn RewardsService>,
        energy_service: Arc<dyn EnergyService>,
    ) -> Self {
        Self {
            auth_service,
            inventory_service,
            rewards_service,
            energy_service,
        }
    }

    /// Wire every service over one Postgres-backed Unit of Work.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let pricing = PricingEngine::new(config.discount_fallback);

        Self {
            inventory_service: Arc::new(InventoryManager::new(uow.clone(), pricing)),
            rewards_service: Arc::new(RewardsManager::new(uow.clone(), mailer.clone())),
            energy_service: Arc::new(EnergyAnalytics::new(uow.clone())),
            auth_service: Arc::new(Authenticator::new(uow, mailer, config)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn inventory(&self) -> Arc<dyn InventoryService> {
        self.inventory_service.clone()
    }

    fn rewards(&self) -> Arc<dyn RewardsService> {
        self.rewards_service.clone()
    }

    fn energy(&self) -> Arc<dyn EnergyService> {
        self.energy_service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        MockAuthService, MockEnergyService, MockInventoryService, MockRewardsService,
    };

    #[test]
    fn hands_out_the_same_instances() {
        let auth: Arc<dyn AuthService> = Arc::new(MockAuthService::new());
        let inventory: Arc<dyn InventoryService> = Arc::new(MockInventoryService::new());
        let rewards: Arc<dyn RewardsService> = Arc::new(MockRewardsService::new());
        let energy: Arc<dyn EnergyService> = Arc::new(MockEnergyService::new());

        let services = Services::new(auth.clone(), inventory.clone(), rewards.clone(), energy.clone());

        assert!(Arc::ptr_eq(&services.auth(), &auth));
        assert!(Arc::ptr_eq(&services.inventory(), &inventory));
        assert!(Arc::ptr_eq(&services.rewards(), &rewards));
        assert!(Arc::ptr_eq(&services.energy(), &energy));
    }
}
