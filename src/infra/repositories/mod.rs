//! Repository layer - Data access abstraction
//!
//! [`DocumentRepository`] gives typed CRUD over a document collection for any
//! [`crate::domain::Entity`]; entity-specific repositories build on it.

mod base;
mod logger;
mod user_repository;

pub use base::DocumentRepository;
pub use logger::{RepositoryLogger, TracingLogger};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use logger::MockRepositoryLogger;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
