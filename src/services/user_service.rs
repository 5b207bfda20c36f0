//! User service - user-related use cases.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{HashedPassword, NewUser, UpdateUser, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a user. Emails are unique.
    async fn create_user(&self, email: String, password: String, name: String) -> AppResult<User>;

    /// User by id, `NotFound` if absent.
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// All users, oldest first.
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Apply a partial update, `NotFound` if absent.
    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User>;

    /// Remove a user; `None` if it was already gone.
    async fn delete_user(&self, id: Uuid) -> AppResult<Option<User>>;
}

/// [`UserService`] over a [`UserRepository`].
pub struct UserManager {
    users: Arc<dyn UserRepository>,
}

impl UserManager {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn create_user(&self, email: String, password: String, name: String) -> AppResult<User> {
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User"));
        }

        let password_hash = HashedPassword::hash(&password)?.into_string();
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.users.find_by_id(id).await
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User> {
        self.users.update(id, changes).await
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let deleted = self.users.delete(id).await?;
        if deleted.is_some() {
            tracing::info!(user_id = %id, "User deleted");
        }
        Ok(deleted)
    }
}
