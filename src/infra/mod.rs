//! Infrastructure layer - External systems integration
//!
//! - Database connection and migrations
//! - Document collections (PostgreSQL and in-memory)
//! - Repositories built on top of collections

pub mod collection;
pub mod db;
pub mod repositories;

pub use collection::{Document, DocumentCollection, Filter, MemoryCollection, PgCollection, Update};
pub use db::{Database, Migrator};
pub use repositories::{DocumentRepository, RepositoryLogger, TracingLogger, UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use collection::MockDocumentCollection;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockRepositoryLogger, MockUserRepository};
