//! PostgreSQL adapter for UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, SqlErr,
};
use uuid::Uuid;

use crate::domain::entities::{NewUser, User, UserId, UserProfileUpdate};
use crate::domain::ports::UserRepository;
use crate::entity::users;
use crate::error::DomainError;

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::ApiKeyHash.eq(hash))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(user.name.clone()),
            email: Set(user.email.to_lowercase()),
            api_key_hash: Set(user.api_key_hash.clone()),
            default_currency: Set(user.default_currency.clone()),
            created_at: Set(now),
            last_seen_at: Set(None),
        };

        let result = model.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            )),
            _ => DomainError::Database(e.to_string()),
        })?;

        Ok(result.into())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &UserProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))?
            .into_active_model();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(currency) = &update.default_currency {
            model.default_currency = Set(currency.clone());
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError> {
        let now = Utc::now().fixed_offset();

        users::ActiveModel {
            id: Set(id.0),
            last_seen_at: Set(Some(now)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: UserId(model.id),
            name: model.name,
            email: model.email,
            api_key_hash: model.api_key_hash,
            default_currency: model.default_currency.trim().to_string(),
            created_at: model.created_at.with_timezone(&Utc),
            last_seen_at: model.last_seen_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
