//! Document store adapter contract for optimistic-concurrency persistence.
//!
//! The engine depends on this abstractly: a key/value document API returning
//! documents with an opaque monotonic version tag, failing with a `NotFound`
//! kind on missing keys and a `VersionConflict` kind on stale writes.
//! Documents travel as `serde_json::Value`s carrying their own `id` and
//! `__etag` fields; the typed helpers below do the encoding at call sites.

mod file_store;
mod memory;

pub use file_store::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use crate::domain::types::Etag;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Logical collections the engine persists into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Criteria documents, keyed by owning work item id.
    Criterias,
    /// Details documents, keyed by criterion id.
    CriteriaDetails,
    /// History documents, keyed by criterion id.
    History,
}

impl Collection {
    /// Returns the collection's storage name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Criterias => "criterias",
            Collection::CriteriaDetails => "criteria_details",
            Collection::History => "history",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Failures surfaced by a document store.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// No document stored under the given key.
    NotFound { collection: Collection, id: String },
    /// Write rejected because the supplied etag does not match the stored one.
    VersionConflict { collection: Collection, id: String },
    /// Any other backend failure.
    Backend { message: String },
}

impl StoreError {
    /// Returns true for the recoverable missing-document kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "document not found: {}/{}", collection, id)
            }
            Self::VersionConflict { collection, id } => {
                write!(f, "version conflict: {}/{}", collection, id)
            }
            Self::Backend { message } => write!(f, "backend failure: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key/value document API with optimistic concurrency.
///
/// Implementations are constructor-injected into the aggregate and ledger,
/// never looked up globally.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads one document.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when no document is stored under `id`.
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError>;

    /// Loads every document in a collection. An absent collection reads as
    /// empty, not as `NotFound`.
    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Persists a document.
    ///
    /// Returns the document with a freshly minted `__etag`. A document absent
    /// from the store is created regardless of the supplied etag.
    ///
    /// # Errors
    ///
    /// `StoreError::VersionConflict` when the supplied `__etag` does not
    /// match the stored value.
    async fn set(&self, collection: Collection, document: Value) -> Result<Value, StoreError>;
}

/// Loads and decodes one typed document.
pub async fn get_doc<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> Result<T, StoreError> {
    let value = store.get(collection, id).await?;
    decode_value(value)
}

/// Encodes, persists, and decodes back one typed document. The returned
/// value carries the freshly minted etag.
pub async fn set_doc<T: Serialize + DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    document: &T,
) -> Result<T, StoreError> {
    let value = serde_json::to_value(document).map_err(|e| StoreError::Backend {
        message: format!("encoding document: {}", e),
    })?;
    let stored = store.set(collection, value).await?;
    decode_value(stored)
}

/// Loads and decodes every typed document in a collection.
pub async fn get_all_docs<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
) -> Result<Vec<T>, StoreError> {
    store
        .get_all(collection)
        .await?
        .into_iter()
        .map(decode_value)
        .collect()
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Backend {
        message: format!("decoding document: {}", e),
    })
}

/// Reads the `id` field a stored document must carry.
pub(crate) fn document_id(document: &Value) -> Result<String, StoreError> {
    document
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Backend {
            message: "document is missing a string `id` field".to_string(),
        })
}

/// Reads the `__etag` field; absent reads as `Etag::UNSET`.
pub(crate) fn document_etag(document: &Value) -> Etag {
    document
        .get("__etag")
        .and_then(Value::as_i64)
        .map(Etag)
        .unwrap_or(Etag::UNSET)
}

/// Returns the document with its `__etag` replaced.
pub(crate) fn stamp_etag(mut document: Value, etag: Etag) -> Value {
    if let Some(object) = document.as_object_mut() {
        object.insert("__etag".to_string(), Value::from(etag.0));
    }
    document
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
