//! Migration: walking and cycling logs.

use sea_orm_migration::prelude::*;

use super::m20250401_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLogs::UserId).uuid().not_null())
                    .col(ColumnDef::new(ActivityLogs::ActivityDate).date().not_null())
                    .col(
                        ColumnDef::new(ActivityLogs::ActivityType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityLogs::Steps).integer().null())
                    .col(
                        ColumnDef::new(ActivityLogs::DistanceKm)
                            .decimal_len(8, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ActivityLogs::EcoPoints)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_logs_user")
                            .from(ActivityLogs::Table, ActivityLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_activity_logs_user_date_type")
                    .table(ActivityLogs::Table)
                    .col(ActivityLogs::UserId)
                    .col(ActivityLogs::ActivityDate)
                    .col(ActivityLogs::ActivityType)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivityLogs {
    Table,
    Id,
    UserId,
    ActivityDate,
    ActivityType,
    Steps,
    DistanceKm,
    EcoPoints,
    CreatedAt,
}
