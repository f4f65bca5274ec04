//! User service
//!
//! Handles registration, API key authentication and profile management.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::app::validation;
use crate::domain::entities::{NewUser, User, UserId, UserProfileUpdate};
use crate::domain::ports::UserRepository;
use crate::error::{AppError, DomainError};

const DEFAULT_CURRENCY: &str = "USD";

/// Service for managing users
pub struct UserService<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>) -> Self {
        Self { users }
    }

    /// Register a new user
    ///
    /// Returns (user, api_key). The key is only ever shown here; the database
    /// keeps its SHA-256 hash.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        default_currency: Option<&str>,
    ) -> Result<(User, String), AppError> {
        let name = validation::text("name", name, 100)?;
        let email = validation::email(email)?;
        let default_currency = validation::currency(default_currency.unwrap_or(DEFAULT_CURRENCY))?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                email
            ))));
        }

        let api_key = generate_api_key();
        let new_user = NewUser {
            name,
            email,
            api_key_hash: hash_api_key(&api_key),
            default_currency,
        };

        let user = self.users.create(&new_user).await?;
        tracing::info!(user_id = %user.id, "user registered");

        Ok((user, api_key))
    }

    /// Find a user by their API key hash
    pub async fn find_by_api_key(&self, api_key_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_api_key_hash(api_key_hash).await?)
    }

    pub async fn get(&self, id: &UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Update user's last seen timestamp
    pub async fn touch(&self, id: &UserId) -> Result<(), AppError> {
        self.users.update_last_seen(id).await?;
        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: &UserId,
        name: Option<&str>,
        default_currency: Option<&str>,
    ) -> Result<User, AppError> {
        if name.is_none() && default_currency.is_none() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let update = UserProfileUpdate {
            name: name.map(|n| validation::text("name", n, 100)).transpose()?,
            default_currency: default_currency.map(validation::currency).transpose()?,
        };

        Ok(self.users.update_profile(id, &update).await?)
    }
}

/// Generate a random API key
fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("sk-{}", hex::encode(bytes))
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
