//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20250401_000001_create_users_table;
mod m20250401_000002_create_inventory_table;
mod m20250401_000003_create_activity_logs_table;
mod m20250401_000004_create_redemptions_table;
mod m20250401_000005_create_energy_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250401_000001_create_users_table::Migration),
            Box::new(m20250401_000002_create_inventory_table::Migration),
            Box::new(m20250401_000003_create_activity_logs_table::Migration),
            Box::new(m20250401_000004_create_redemptions_table::Migration),
            Box::new(m20250401_000005_create_energy_tables::Migration),
        ]
    }
}
