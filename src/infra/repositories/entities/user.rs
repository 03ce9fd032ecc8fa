//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{OneTimeCode, User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub verified: bool,
    pub otp_code: Option<String>,
    pub otp_expires_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::activity_log::Entity")]
    ActivityLogs,
    #[sea_orm(has_many = "super::redemption::Entity")]
    Redemptions,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::activity_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        let otp = match (model.otp_code, model.otp_expires_at) {
            (Some(code), Some(expires_at)) => Some(OneTimeCode::new(code, expires_at)),
            _ => None,
        };
        User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            role: UserRole::from(model.role.as_str()),
            verified: model.verified,
            otp,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(user.role.to_string()),
            verified: Set(user.verified),
            otp_code: Set(user.otp.as_ref().map(|o| o.code().to_string())),
            otp_expires_at: Set(user.otp.as_ref().map(|o| o.expires_at())),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
