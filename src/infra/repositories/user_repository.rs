//! User repository backed by the `users` document collection.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use super::base::DocumentRepository;
use super::logger::TracingLogger;
use crate::domain::{NewUser, UpdateUser, User};
use crate::errors::{AppError, AppResult};
use crate::infra::collection::{DocumentCollection, Filter, Update};

/// User persistence operations.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user; the id is generated here.
    ///
    /// # Errors
    /// `Conflict("User")` when the email is already registered, enforced by
    /// the collection itself so concurrent registrations cannot both succeed.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// User by id, `NotFound` if absent.
    async fn find_by_id(&self, id: Uuid) -> AppResult<User>;

    /// User by email, `None` if absent.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// All users, oldest first.
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Apply `changes` and return the updated user, `NotFound` if absent.
    async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<User>;

    /// Remove the user, returning it if it existed.
    async fn delete(&self, id: Uuid) -> AppResult<Option<User>>;
}

/// [`UserRepository`] over any document collection.
pub struct UserStore {
    users: DocumentRepository<User>,
}

impl UserStore {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            users: DocumentRepository::new(collection, Arc::new(TracingLogger::new("UserStore"))),
        }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        match self.users.create(user).await {
            Err(AppError::Conflict(_)) => Err(AppError::conflict("User")),
            other => other,
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<User> {
        self.users.find_one(Filter::by_id(id)).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        // Goes through `find` so an unknown email is not reported as a miss.
        let mut matches = self.users.find(Filter::new().eq("email", email)).await?;
        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        })
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        self.users.find(Filter::new()).await
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<User> {
        let update = Update::from_partial(&changes)?;
        if update.is_empty() {
            return self.find_by_id(id).await;
        }
        self.users.find_one_and_update(Filter::by_id(id), update).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<User>> {
        self.users.find_one_and_delete(Filter::by_id(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entity;
    use crate::infra::collection::MemoryCollection;

    fn store() -> UserStore {
        UserStore::new(Arc::new(
            MemoryCollection::new(User::COLLECTION).with_unique_fields(User::UNIQUE_FIELDS),
        ))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$hash".to_string(),
            name: "Ada".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_look_up() {
        let store = store();
        let user = store.create(new_user("ada@example.com")).await.unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap(), user);
        assert_eq!(
            store.find_by_email("ada@example.com").await.unwrap(),
            Some(user)
        );
        assert_eq!(store.find_by_email("bob@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_leaves_omitted_fields() {
        let store = store();
        let user = store.create(new_user("ada@example.com")).await.unwrap();

        let unchanged = store.update(user.id, UpdateUser::default()).await.unwrap();
        assert_eq!(unchanged, user);

        let renamed = store
            .update(
                user.id,
                UpdateUser {
                    name: Some("Ada Lovelace".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Ada Lovelace");
        assert_eq!(renamed.email, user.email);
        assert_eq!(renamed.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_user_conflict() {
        let store = store();
        store.create(new_user("ada@example.com")).await.unwrap();

        let result = store.create(new_user("ada@example.com")).await;

        assert!(matches!(result, Err(AppError::Conflict(entity)) if entity == "User"));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_user_paths() {
        let store = store();
        let id = Uuid::new_v4();

        assert!(matches!(store.find_by_id(id).await, Err(AppError::NotFound)));
        assert!(matches!(
            store.update(id, UpdateUser::default()).await,
            Err(AppError::NotFound)
        ));
        assert_eq!(store.delete(id).await.unwrap(), None);
        assert!(store.list().await.unwrap().is_empty());
    }
}
