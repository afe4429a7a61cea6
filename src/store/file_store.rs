//! File-based document store implementation.
//!
//! Stores each document as one JSON file under `<root>/<collection>/` with
//! support for:
//! - Optimistic concurrency via the persisted `__etag` field
//! - Advisory file locking per collection
//! - Atomic writes via temp file + rename

use crate::domain::types::Etag;
use crate::store::{document_etag, document_id, stamp_etag, Collection, DocumentStore, StoreError};
use async_trait::async_trait;
use fs2::FileExt;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Document store backed by one JSON file per document.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    /// Root directory; one subdirectory per collection.
    root: PathBuf,
}

impl FileDocumentStore {
    /// Creates a store rooted at the given directory. Directories are
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.name())
    }

    fn document_path(&self, collection: Collection, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.json", id))
    }

    /// Opens the per-collection lock file, creating the directory as needed.
    fn open_lock(&self, collection: Collection) -> Result<File, StoreError> {
        let dir = self.collection_dir(collection);
        std::fs::create_dir_all(&dir).map_err(|e| backend("creating collection dir", &e))?;
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(dir.join(".lock"))
            .map_err(|e| backend("opening lock file", &e))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        if !self.collection_dir(collection).is_dir() {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }

        let lock = self.open_lock(collection)?;
        lock.lock_shared()
            .map_err(|e| backend("acquiring shared lock", &e))?;

        read_document(self.document_path(collection, id), collection, id)
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let dir = self.collection_dir(collection);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let lock = self.open_lock(collection)?;
        lock.lock_shared()
            .map_err(|e| backend("acquiring shared lock", &e))?;

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
            .map_err(|e| backend("listing collection", &e))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let content =
                std::fs::read_to_string(&path).map_err(|e| backend("reading document", &e))?;
            let document: Value =
                serde_json::from_str(&content).map_err(|e| backend("parsing document", &e))?;
            documents.push(document);
        }

        Ok(documents)
    }

    async fn set(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        let id = document_id(&document)?;
        let supplied = document_etag(&document);

        let lock = self.open_lock(collection)?;
        lock.lock_exclusive()
            .map_err(|e| backend("acquiring exclusive lock", &e))?;

        let path = self.document_path(collection, &id);

        // Check for concurrent writes (optimistic concurrency)
        let minted = match read_document(path.clone(), collection, &id) {
            Ok(stored) => {
                let current = document_etag(&stored);
                if supplied != current {
                    return Err(StoreError::VersionConflict { collection, id });
                }
                Etag(current.0 + 1)
            }
            Err(StoreError::NotFound { .. }) => Etag(1),
            Err(e) => return Err(e),
        };

        let stamped = stamp_etag(document, minted);
        let content =
            serde_json::to_string(&stamped).map_err(|e| backend("encoding document", &e))?;

        // Write to temp file, then rename for atomicity
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(|e| backend("writing document", &e))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| backend("replacing document", &e))?;

        Ok(stamped)
    }
}

fn read_document(path: PathBuf, collection: Collection, id: &str) -> Result<Value, StoreError> {
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
        }
        Err(e) => return Err(backend("reading document", &e)),
    };

    serde_json::from_str(&content).map_err(|e| backend("parsing document", &e))
}

fn backend(context: &str, error: &dyn std::fmt::Display) -> StoreError {
    StoreError::Backend {
        message: format!("{}: {}", context, error),
    }
}

#[cfg(test)]
#[path = "tests/file_store_tests.rs"]
mod tests;
