//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - HTTP server plus digest, sensor and ingest workers
//! - `migrate` - Database migrations
//! - `jobs` - Email worker and one-off digest
//! - `simulate` - Sensor or activity simulators in the foreground

pub mod args;

pub use args::{Cli, Commands};
