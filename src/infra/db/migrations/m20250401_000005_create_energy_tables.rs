//! Migration: buildings and their meter readings.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Buildings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Buildings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Buildings::Name).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Buildings::Code)
                            .string_len(16)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Buildings::Zone)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EnergyReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnergyReadings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EnergyReadings::BuildingId).uuid().not_null())
                    .col(
                        ColumnDef::new(EnergyReadings::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnergyReadings::Category)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnergyReadings::Value).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_energy_readings_building")
                            .from(EnergyReadings::Table, EnergyReadings::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Chart queries filter by building and category over a time range.
        manager
            .create_index(
                Index::create()
                    .name("idx_energy_readings_building_category_ts")
                    .table(EnergyReadings::Table)
                    .col(EnergyReadings::BuildingId)
                    .col(EnergyReadings::Category)
                    .col(EnergyReadings::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EnergyReadings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Buildings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Buildings {
    Table,
    Id,
    Name,
    Code,
    Zone,
}

#[derive(Iden)]
enum EnergyReadings {
    Table,
    Id,
    BuildingId,
    Timestamp,
    Category,
    Value,
}
