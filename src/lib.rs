//! Green Campus - campus sustainability backend
//!
//! A surplus-food marketplace with expiry-driven discounts, an eco-points
//! ledger fed by walking and cycling, and building energy monitoring from
//! simulated meters.
//!
//! # Architecture Layers
//!
//! - **cli** / **commands**: `serve`, `migrate`, `jobs`, `simulate`
//! - **config**: environment settings and business constants
//! - **domain**: entities, pricing, ledger and chart shaping
//! - **services**: use cases behind traits
//! - **infra**: Postgres repositories, Unit of Work, Redis, mail
//! - **iot**: building catalogue, sensor bus, simulator and ingest
//! - **jobs**: email queue, discount digest, activity backfill, scheduler
//! - **api**: HTTP handlers, middleware, and routes
//! - **errors**: centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! cargo run -- serve
//! cargo run -- migrate up
//! cargo run -- jobs digest
//! cargo run -- simulate sensors --ticks 1
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod iot;
pub mod jobs;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Password, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
