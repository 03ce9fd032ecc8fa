//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Green Campus - marketplace, eco-points and energy monitoring backend
#[derive(Parser, Debug)]
#[command(name = "green-campus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Load environment variables from this file before reading config
    #[arg(short, long, global = true, env = "ENV_FILE")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server and background workers
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage background jobs
    Jobs(JobsArgs),

    /// Run a simulator in the foreground
    Simulate(SimulateArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to (defaults to SERVER_HOST)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on (defaults to SERVER_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not apply pending migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,

    /// Serve HTTP only: no digest scheduler, sensor simulator or ingest
    #[arg(long)]
    pub no_background: bool,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the jobs command
#[derive(Parser, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub action: JobsAction,
}

/// Job management actions
#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// Start the email worker
    Work,
    /// Send the discount digest once, now
    Digest,
    /// List queued email jobs
    List,
    /// Clear failed jobs
    Clear,
}

/// Arguments for the simulate command
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    #[command(subcommand)]
    pub target: SimulateTarget,
}

#[derive(Subcommand, Debug)]
pub enum SimulateTarget {
    /// Publish meter readings and store them until Ctrl+C
    Sensors {
        /// Stop after this many rounds
        #[arg(long)]
        ticks: Option<u64>,
        /// Seconds between rounds (defaults to SENSOR_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Backfill walking and cycling history up to today
    Activity,
}
