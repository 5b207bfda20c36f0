//! Document collections - the storage port behind every repository.
//!
//! A collection stores plain JSON documents keyed by `_id`. Adapters may keep
//! bookkeeping (version, timestamps) next to each document, but what they
//! hand back is always the bare document.

mod entity;
mod filter;
mod memory;
mod postgres;
mod update;

use async_trait::async_trait;
use serde_json::{Map, Value};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::errors::AppResult;

pub use filter::Filter;
pub use memory::{DocumentMeta, MemoryCollection};
pub use postgres::PgCollection;
pub use update::Update;

/// A stored record without storage metadata.
pub type Document = Map<String, Value>;

/// Storage backend for one named collection.
///
/// "First" always means earliest created. Every method is a single round
/// trip; backend failures are returned as-is.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Persist a new document, which must carry an `_id`.
    async fn insert_one(&self, document: Document) -> AppResult<Document>;

    /// First document matching `filter`.
    async fn find_one(&self, filter: &Filter) -> AppResult<Option<Document>>;

    /// Apply `update` to the first match and return its new state.
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> AppResult<Option<Document>>;

    /// Every document matching `filter`, oldest first.
    async fn find(&self, filter: &Filter) -> AppResult<Vec<Document>>;

    /// Remove the first match and return its prior state.
    async fn find_one_and_delete(&self, filter: &Filter) -> AppResult<Option<Document>>;
}
