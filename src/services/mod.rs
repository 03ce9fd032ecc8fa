//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure through the Unit
//! of Work and are exposed to handlers as trait objects.

mod auth_service;
pub mod container;
mod energy_service;
mod inventory_service;
mod rewards_service;

use chrono::{Local, NaiveDate};

pub use container::{ServiceContainer, Services};

pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use energy_service::{EnergyAnalytics, EnergyService};
pub use inventory_service::{InventoryManager, InventoryService};
pub use rewards_service::{RewardsDashboard, RewardsManager, RewardsService};

#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use energy_service::MockEnergyService;
#[cfg(any(test, feature = "test-utils"))]
pub use inventory_service::MockInventoryService;
#[cfg(any(test, feature = "test-utils"))]
pub use rewards_service::MockRewardsService;

/// The campus-local calendar day expiry dates are compared against.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
