//! PostgreSQL adapter: every collection lives in the `documents` table as
//! `jsonb`, and filters compile to the `@>` containment operator.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    IntoActiveModel, SqlErr, Statement, TransactionTrait, Value as DbValue,
};
use serde_json::Value;
use uuid::Uuid;

use super::entity::{self, Entity as DocumentEntity};
use super::{Document, DocumentCollection, Filter, Update};
use crate::config::ID_FIELD;
use crate::errors::{AppError, AppResult};

const SELECT_MATCHING: &str = r#"SELECT * FROM documents
WHERE collection = $1 AND body @> $2
ORDER BY created_at, id"#;

const SELECT_FIRST_FOR_UPDATE: &str = r#"SELECT * FROM documents
WHERE collection = $1 AND body @> $2
ORDER BY created_at, id
LIMIT 1
FOR UPDATE"#;

const DELETE_FIRST: &str = r#"DELETE FROM documents
WHERE collection = $1 AND id = (
    SELECT id FROM documents
    WHERE collection = $1 AND body @> $2
    ORDER BY created_at, id
    LIMIT 1
    FOR UPDATE
)
RETURNING *"#;

/// Collection stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgCollection {
    db: DatabaseConnection,
    name: String,
}

impl PgCollection {
    pub fn new(db: DatabaseConnection, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
        }
    }

    fn statement(&self, sql: &str, filter: &Filter) -> Statement {
        let values: [DbValue; 2] = [self.name.clone().into(), filter.to_containment().into()];
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }

    fn first_match(&self, filter: &Filter) -> Statement {
        self.statement(&format!("{} LIMIT 1", SELECT_MATCHING), filter)
    }

    /// Unique index violations (duplicate `_id`, or a field with a unique
    /// index such as a user's email) become `Conflict`.
    fn write_error(&self, err: DbErr) -> AppError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(collection = %self.name, %detail, "Unique constraint violated");
                AppError::conflict(format!("Document in '{}'", self.name))
            }
            _ => AppError::Database(err),
        }
    }
}

/// Strip bookkeeping columns, keeping the bare document.
fn into_document(model: entity::Model) -> AppResult<Document> {
    match model.body {
        Value::Object(document) => Ok(document),
        other => Err(AppError::internal(format!(
            "document {} in '{}' is not a JSON object: {}",
            model.id, model.collection, other
        ))),
    }
}

fn document_id(document: &Document) -> AppResult<Uuid> {
    let raw = document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::bad_request(format!("document is missing '{}'", ID_FIELD)))?;

    Uuid::parse_str(raw)
        .map_err(|e| AppError::bad_request(format!("'{}' is not a UUID: {}", ID_FIELD, e)))
}

#[async_trait]
impl DocumentCollection for PgCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, document: Document) -> AppResult<Document> {
        let id = document_id(&document)?;
        let now = Utc::now().fixed_offset();

        let inserted = entity::ActiveModel {
            collection: Set(self.name.clone()),
            id: Set(id),
            body: Set(Value::Object(document)),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| self.write_error(e))?;

        tracing::debug!(collection = %self.name, %id, "Document inserted");
        into_document(inserted)
    }

    async fn find_one(&self, filter: &Filter) -> AppResult<Option<Document>> {
        DocumentEntity::find()
            .from_raw_sql(self.first_match(filter))
            .one(&self.db)
            .await?
            .map(into_document)
            .transpose()
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> AppResult<Option<Document>> {
        let txn = self.db.begin().await?;

        let Some(current) = DocumentEntity::find()
            .from_raw_sql(self.statement(SELECT_FIRST_FOR_UPDATE, filter))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let version = current.version;
        let mut body = into_document(current.clone())?;
        if let Err(e) = update.apply(&mut body) {
            txn.rollback().await?;
            return Err(e);
        }

        let mut active = current.into_active_model();
        active.body = Set(Value::Object(body));
        active.version = Set(version + 1);
        active.updated_at = Set(Utc::now().fixed_offset());
        // Dropping the transaction on error rolls it back.
        let updated = active.update(&txn).await.map_err(|e| self.write_error(e))?;

        txn.commit().await?;
        into_document(updated).map(Some)
    }

    async fn find(&self, filter: &Filter) -> AppResult<Vec<Document>> {
        DocumentEntity::find()
            .from_raw_sql(self.statement(SELECT_MATCHING, filter))
            .all(&self.db)
            .await?
            .into_iter()
            .map(into_document)
            .collect()
    }

    async fn find_one_and_delete(&self, filter: &Filter) -> AppResult<Option<Document>> {
        DocumentEntity::find()
            .from_raw_sql(self.statement(DELETE_FIRST, filter))
            .one(&self.db)
            .await?
            .map(into_document)
            .transpose()
    }
}
