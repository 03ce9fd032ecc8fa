//! Repository layer - Data access abstraction
//!
//! One trait per aggregate with a SeaORM-backed `*Store`. Traits are
//! mockable under `test` / `test-utils`.

mod activity_repository;
pub(crate) mod entities;
mod energy_repository;
mod product_repository;
mod reward_repository;
mod user_repository;

pub use activity_repository::{ActivityRepository, ActivityStore, DayAverage};
pub use energy_repository::{EnergyRepository, EnergyStore};
pub use product_repository::{ProductRepository, ProductStore};
pub use reward_repository::{RewardRepository, RewardStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use activity_repository::MockActivityRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use energy_repository::MockEnergyRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use product_repository::MockProductRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use reward_repository::MockRewardRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
