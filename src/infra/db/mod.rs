//! Postgres handle and schema control for the `serve` and `migrate`
//! commands.

use std::collections::HashSet;

use sea_orm::{ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;

use crate::config::Config;

pub mod migrations;

pub use migrations::Migrator;

#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect, then bring the schema up to date.
    pub async fn connect(config: &Config) -> Result<Self, DbErr> {
        let db = Self::connect_without_migrations(config).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn connect_without_migrations(config: &Config) -> Result<Self, DbErr> {
        let connection = SeaDatabase::connect(&config.database_url).await?;
        Ok(Self { connection })
    }

    /// A cloned pooled connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(&self.connection, None).await?;
        tracing::info!("Schema up to date");
        Ok(())
    }

    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(&self.connection, Some(1)).await
    }

    /// `(name, applied)` for every migration, oldest first.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        let applied: HashSet<String> = Migrator::get_applied_migrations(&self.connection)
            .await?
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|m| (m.name().to_string(), applied.contains(m.name())))
            .collect())
    }

    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(&self.connection).await
    }

    /// Round-trip for the health endpoint.
    pub async fn ping(&self) -> Result<(), DbErr> {
        let backend = self.connection.get_database_backend();
        self.connection
            .execute(Statement::from_string(backend, "SELECT 1"))
            .await
            .map(|_| ())
    }
}
