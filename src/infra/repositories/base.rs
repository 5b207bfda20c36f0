//! Generic document repository.
//!
//! One repository per entity type, wrapping a [`DocumentCollection`] and a
//! [`RepositoryLogger`]. Each operation is a single round trip; the only
//! thing the repository adds is identifier assignment on create and the
//! translation of "nothing matched" into [`AppError::NotFound`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::logger::RepositoryLogger;
use crate::config::{ID_FIELD, NOT_FOUND_LOG_MESSAGE};
use crate::domain::Entity;
use crate::errors::{AppError, AppResult};
use crate::infra::collection::{Document, DocumentCollection, Filter, Update};

/// CRUD access to the documents of one entity type.
pub struct DocumentRepository<E: Entity> {
    collection: Arc<dyn DocumentCollection>,
    logger: Arc<dyn RepositoryLogger>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for DocumentRepository<E> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            logger: self.logger.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> DocumentRepository<E> {
    pub fn new(collection: Arc<dyn DocumentCollection>, logger: Arc<dyn RepositoryLogger>) -> Self {
        Self {
            collection,
            logger,
            _entity: PhantomData,
        }
    }

    /// Persist `draft` under a freshly generated identifier.
    pub async fn create(&self, draft: E::Draft) -> AppResult<E> {
        let mut document = to_document(&draft)?;
        document.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));

        let stored = self.collection.insert_one(document).await?;
        let entity: E = from_document(stored)?;

        tracing::debug!(collection = E::COLLECTION, id = %entity.id(), "Document created");
        Ok(entity)
    }

    /// First entity matching `filter`.
    ///
    /// # Errors
    /// `NotFound` (logged with the filter) when nothing matches.
    pub async fn find_one(&self, filter: Filter) -> AppResult<E> {
        match self.collection.find_one(&filter).await? {
            Some(document) => from_document(document),
            None => Err(self.not_found(&filter)),
        }
    }

    /// Apply `update` to the first match and return the updated entity.
    ///
    /// # Errors
    /// `NotFound` (logged with the filter) when nothing matches.
    pub async fn find_one_and_update(&self, filter: Filter, update: Update) -> AppResult<E> {
        match self.collection.find_one_and_update(&filter, &update).await? {
            Some(document) => from_document(document),
            None => Err(self.not_found(&filter)),
        }
    }

    /// Every entity matching `filter`; empty when nothing matches.
    pub async fn find(&self, filter: Filter) -> AppResult<Vec<E>> {
        self.collection
            .find(&filter)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Remove the first match and return it.
    ///
    /// Unlike the read and update paths, a miss is not an error: it yields
    /// `None` and is not logged.
    pub async fn find_one_and_delete(&self, filter: Filter) -> AppResult<Option<E>> {
        self.collection
            .find_one_and_delete(&filter)
            .await?
            .map(from_document)
            .transpose()
    }

    fn not_found(&self, filter: &Filter) -> AppError {
        self.logger.warn(NOT_FOUND_LOG_MESSAGE, filter);
        AppError::NotFound
    }
}

fn to_document<T: Serialize>(value: &T) -> AppResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(AppError::internal(format!(
            "entity must serialize to a JSON object, got {}",
            other
        ))),
    }
}

fn from_document<E: DeserializeOwned>(document: Document) -> AppResult<E> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
