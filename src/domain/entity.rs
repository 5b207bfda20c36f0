//! Entity abstraction shared by every document-backed repository.

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// A record stored as one document in a named collection.
///
/// The identifier lives under the `_id` document key (see
/// [`crate::config::ID_FIELD`]) and is assigned by the repository when the
/// entity is created, so callers hand over a [`Entity::Draft`] instead.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the entity is stored in.
    const COLLECTION: &'static str;

    /// Top-level document fields no two entities may share.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    /// The entity without its identifier, as accepted by `create`.
    type Draft: Serialize + Send + Sync + 'static;

    /// Unique identifier.
    fn id(&self) -> Uuid;
}
