//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod activity_log;
pub mod building;
pub mod energy_reading;
pub mod product;
pub mod redemption;
pub mod user;
