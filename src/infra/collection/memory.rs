//! In-process collection used by tests and `serve --in-memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, DocumentCollection, Filter, Update};
use crate::config::ID_FIELD;
use crate::errors::{AppError, AppResult};

/// Bookkeeping kept next to each stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Number of updates applied since insertion
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Entry {
    body: Document,
    meta: DocumentMeta,
}

/// Collection held in memory, in insertion order.
///
/// Writers take the lock exclusively, so concurrent updates of one document
/// are applied one after another and unique fields are checked against the
/// state they are about to change.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    unique_fields: Vec<String>,
    entries: RwLock<Vec<Entry>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique_fields: Vec::new(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Reject writes that would give two documents the same value in any
    /// of `fields` (top-level keys; absent and `null` values are exempt).
    pub fn with_unique_fields(mut self, fields: &[&str]) -> Self {
        self.unique_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Metadata of the document with identifier `id`, if stored.
    pub async fn metadata(&self, id: &Value) -> Option<DocumentMeta> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.body.get(ID_FIELD) == Some(id))
            .map(|entry| entry.meta)
    }

    /// Caller holds the write lock; `skip` is the entry being replaced.
    fn check_unique(
        &self,
        entries: &[Entry],
        document: &Document,
        skip: Option<usize>,
    ) -> AppResult<()> {
        for field in &self.unique_fields {
            let Some(value) = document.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = entries
                .iter()
                .enumerate()
                .any(|(i, entry)| Some(i) != skip && entry.body.get(field) == Some(value));
            if taken {
                tracing::debug!(collection = %self.name, field = %field, "Unique field taken");
                return Err(AppError::conflict(format!("Document with this '{}'", field)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, document: Document) -> AppResult<Document> {
        let id = document
            .get(ID_FIELD)
            .cloned()
            .ok_or_else(|| AppError::bad_request(format!("document is missing '{}'", ID_FIELD)))?;

        let mut entries = self.entries.write().await;
        if entries.iter().any(|entry| entry.body.get(ID_FIELD) == Some(&id)) {
            return Err(AppError::conflict(format!("Document {}", id)));
        }
        self.check_unique(&entries, &document, None)?;

        let now = Utc::now();
        entries.push(Entry {
            body: document.clone(),
            meta: DocumentMeta {
                version: 0,
                created_at: now,
                updated_at: now,
            },
        });

        tracing::debug!(collection = %self.name, id = %id, "Document inserted");
        Ok(document)
    }

    async fn find_one(&self, filter: &Filter) -> AppResult<Option<Document>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|entry| filter.matches(&entry.body))
            .map(|entry| entry.body.clone()))
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> AppResult<Option<Document>> {
        let mut entries = self.entries.write().await;
        let Some(index) = entries.iter().position(|entry| filter.matches(&entry.body)) else {
            return Ok(None);
        };

        let mut body = entries[index].body.clone();
        update.apply(&mut body)?;
        self.check_unique(&entries, &body, Some(index))?;

        let entry = &mut entries[index];
        entry.body = body.clone();
        entry.meta.version += 1;
        entry.meta.updated_at = Utc::now();

        Ok(Some(body))
    }

    async fn find(&self, filter: &Filter) -> AppResult<Vec<Document>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| filter.matches(&entry.body))
            .map(|entry| entry.body.clone())
            .collect())
    }

    async fn find_one_and_delete(&self, filter: &Filter) -> AppResult<Option<Document>> {
        let mut entries = self.entries.write().await;
        let position = entries.iter().position(|entry| filter.matches(&entry.body));

        Ok(position.map(|index| entries.remove(index).body))
    }
}
