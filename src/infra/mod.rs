//! Infrastructure layer - External systems integration
//!
//! - Postgres connection, migrations and repositories
//! - Redis counters for rate limiting
//! - Outbound mail
//! - Unit of Work for the atomic workflows

pub mod cache;
pub mod db;
pub mod mailer;
pub mod repositories;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use mailer::{EmailMessage, LogMailer, Mailer};
pub use repositories::{
    ActivityRepository, DayAverage, EnergyRepository, ProductRepository, RewardRepository,
    UserRepository,
};
pub use unit_of_work::{Persistence, RedemptionPlan, Repricer, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockActivityRepository, MockEnergyRepository, MockProductRepository, MockRewardRepository,
    MockUserRepository,
};
#[cfg(any(test, feature = "test-utils"))]
pub use unit_of_work::MockUnitOfWork;
#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
