//! Migration: vendor inventory.

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
                    .table(Inventory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Inventory::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Inventory::VendorId).uuid().not_null())
                    .col(ColumnDef::new(Inventory::Name).string().not_null())
                    .col(ColumnDef::new(Inventory::Category).string_len(1).not_null())
                    .col(ColumnDef::new(Inventory::ExpiryDate).date().not_null())
                    .col(
                        ColumnDef::new(Inventory::Units)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Inventory::MarkedPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Inventory::Discount).decimal_len(5, 2).null())
                    .col(
                        ColumnDef::new(Inventory::FinalPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Inventory::Location).string().not_null())
                    .col(
                        ColumnDef::new(Inventory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Inventory::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_vendor")
                            .from(Inventory::Table, Inventory::VendorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Digest and offers scan by expiry.
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_expiry_date")
                    .table(Inventory::Table)
                    .col(Inventory::ExpiryDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_vendor_name")
                    .table(Inventory::Table)
                    .col(Inventory::VendorId)
                    .col(Inventory::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Inventory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Inventory {
    Table,
    Id,
    VendorId,
    Name,
    Category,
    ExpiryDate,
    Units,
    MarkedPrice,
    Discount,
    FinalPrice,
    Location,
    CreatedAt,
    UpdatedAt,
}
