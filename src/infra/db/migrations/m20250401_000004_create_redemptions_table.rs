//! Migration: redemption entries and their vouchers.

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
                    .table(Redemptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Redemptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Redemptions::UserId).uuid().not_null())
                    .col(ColumnDef::new(Redemptions::Points).big_integer().not_null())
                    .col(
                        ColumnDef::new(Redemptions::Value)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Redemptions::VoucherCode)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Redemptions::Debits).json_binary().not_null())
                    .col(
                        ColumnDef::new(Redemptions::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Redemptions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Redemptions::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Redemptions::ClaimedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_redemptions_user")
                            .from(Redemptions::Table, Redemptions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_redemptions_user_id")
                    .table(Redemptions::Table)
                    .col(Redemptions::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Redemptions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Redemptions {
    Table,
    Id,
    UserId,
    Points,
    Value,
    VoucherCode,
    Debits,
    IssuedAt,
    ExpiresAt,
    ClaimedAt,
    ClaimedBy,
}
