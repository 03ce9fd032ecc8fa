//! Inventory table.

use sea_orm::entity::prelude::*;

use crate::domain::{Category, Product};
use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    /// Single-letter category code
    pub category: String,
    pub expiry_date: Date,
    pub units: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub marked_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub discount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub final_price: Decimal,
    pub location: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::VendorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Vendor,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        Ok(Product {
            id: model.id,
            vendor_id: model.vendor_id,
            name: model.name,
            category: Category::parse(&model.category)?,
            expiry_date: model.expiry_date,
            units: model.units,
            marked_price: model.marked_price,
            discount: model.discount,
            final_price: model.final_price,
            location: model.location,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Product> for ActiveModel {
    fn from(p: &Product) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(p.id),
            vendor_id: Set(p.vendor_id),
            name: Set(p.name.clone()),
            category: Set(p.category.code().to_string()),
            expiry_date: Set(p.expiry_date),
            units: Set(p.units),
            marked_price: Set(p.marked_price),
            discount: Set(p.discount),
            final_price: Set(p.final_price),
            location: Set(p.location.clone()),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        }
    }
}

pub(crate) fn into_products(models: Vec<Model>) -> AppResult<Vec<Product>> {
    models.into_iter().map(Product::try_from).collect()
}
