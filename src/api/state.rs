//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::{Entity, User};
use crate::infra::{Database, DocumentCollection, MemoryCollection, PgCollection, UserStore};
use crate::services::{AuthService, Authenticator, UserManager, UserService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    /// `None` when serving from memory
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// Wire services manually (tests, alternative backends).
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        database: Option<Arc<Database>>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            database,
        }
    }

    /// Wire services over an arbitrary users collection.
    pub fn with_users_collection(
        users: Arc<dyn DocumentCollection>,
        database: Option<Arc<Database>>,
        config: Config,
    ) -> Self {
        let store = Arc::new(UserStore::new(users));
        let auth_service = Arc::new(Authenticator::new(store.clone(), config));
        let user_service = Arc::new(UserManager::new(store));

        Self::new(auth_service, user_service, database)
    }

    /// Services backed by PostgreSQL.
    pub fn from_database(database: Arc<Database>, config: Config) -> Self {
        let users = Arc::new(PgCollection::new(database.get_connection(), User::COLLECTION));
        Self::with_users_collection(users, Some(database), config)
    }

    /// Services backed by process memory; nothing survives a restart.
    pub fn in_memory(config: Config) -> Self {
        let users =
            MemoryCollection::new(User::COLLECTION).with_unique_fields(User::UNIQUE_FIELDS);
        Self::with_users_collection(Arc::new(users), None, config)
    }
}
