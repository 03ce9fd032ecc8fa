//! User repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Emails are matched case-insensitively.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a fully built user
    async fn create(&self, user: User) -> AppResult<User>;

    /// Persist every mutable field of `user`
    async fn save(&self, user: &User) -> AppResult<User>;

    async fn list(&self) -> AppResult<Vec<User>>;

    /// Addresses of every registered user, for broadcasts
    async fn emails(&self) -> AppResult<Vec<String>>;
}

/// SeaORM-backed implementation
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::from(&user)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let model = ActiveModel::from(user)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => AppError::NotFound,
                other => AppError::from(other),
            })?;
        Ok(User::from(model))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn emails(&self) -> AppResult<Vec<String>> {
        let emails = UserEntity::find()
            .select_only()
            .column(user::Column::Email)
            .order_by_asc(user::Column::Email)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(emails)
    }
}
