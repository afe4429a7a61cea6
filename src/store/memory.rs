//! In-memory document store.
//!
//! Primary test double and embeddable default. Etags are minted by
//! incrementing the stored document's version on every successful write.

use crate::domain::types::Etag;
use crate::store::{document_etag, document_id, stamp_etag, Collection, DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Thread-safe in-memory document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, HashMap<String, Value>>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, HashMap::len)
    }

    /// Returns true if a collection holds no documents.
    pub async fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        self.collections
            .read()
            .await
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let guard = self.collections.read().await;
        let Some(documents) = guard.get(&collection) else {
            return Ok(Vec::new());
        };

        // Sorted by id for deterministic iteration order
        let mut entries: Vec<(&String, &Value)> = documents.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        Ok(entries.into_iter().map(|(_, v)| v.clone()).collect())
    }

    async fn set(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        let id = document_id(&document)?;
        let supplied = document_etag(&document);

        let mut guard = self.collections.write().await;
        let documents = guard.entry(collection).or_default();

        let minted = match documents.get(&id) {
            Some(stored) => {
                let current = document_etag(stored);
                if supplied != current {
                    return Err(StoreError::VersionConflict { collection, id });
                }
                Etag(current.0 + 1)
            }
            None => Etag(1),
        };

        let stamped = stamp_etag(document, minted);
        documents.insert(id, stamped.clone());
        Ok(stamped)
    }
}
