//! Tests for the history ledger.

use super::*;
use crate::store::MemoryDocumentStore;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

fn ledger() -> (Arc<MemoryDocumentStore>, HistoryLedger) {
    let store = Arc::new(MemoryDocumentStore::new());
    let ledger = HistoryLedger::new(store.clone());
    (store, ledger)
}

#[tokio::test]
async fn test_get_history_on_missing_id_degrades_to_empty() {
    let (_store, ledger) = ledger();
    let id = CriterionId::new();

    let history = ledger.get_history(&id).await.expect("no failure");

    assert_eq!(history.id, id);
    assert_eq!(history.etag, Etag::UNSET);
    assert!(history.items.is_empty());
}

#[tokio::test]
async fn test_append_prepends_and_grows_by_one() {
    let (_store, ledger) = ledger();
    let id = CriterionId::new();

    let completed = ledger.process_event(ProcessEvent::Complete, None, None);
    let history = ledger
        .create_or_update(&id, completed)
        .await
        .expect("first append");
    assert_eq!(history.items.len(), 1);
    assert_eq!(history.items[0].event, HistoryEvent::Completed);

    let reopened = ledger.process_event(ProcessEvent::ResetToNew, None, None);
    let history = ledger
        .create_or_update(&id, reopened)
        .await
        .expect("second append");
    assert_eq!(history.items.len(), 2);
    // Newest first
    assert_eq!(history.items[0].event, HistoryEvent::ReOpened);
    assert_eq!(history.items[1].event, HistoryEvent::Completed);
}

#[tokio::test]
async fn test_appends_persist_across_reads() {
    let (_store, ledger) = ledger();
    let id = CriterionId::new();

    let item = ledger.process_event(ProcessEvent::Complete, None, None);
    ledger.create_or_update(&id, item).await.expect("append");

    let reloaded = ledger.get_history(&id).await.expect("reload");
    assert_eq!(reloaded.items.len(), 1);
    assert!(!reloaded.etag.is_unset());
}

#[test]
fn test_process_event_mapping_is_total() {
    let (_store, ledger) = ledger();

    let cases = [
        (ProcessEvent::Approve, HistoryEvent::Approved),
        (ProcessEvent::Reject, HistoryEvent::Rejected),
        (ProcessEvent::Complete, HistoryEvent::Completed),
        (ProcessEvent::ResetToNew, HistoryEvent::ReOpened),
        (ProcessEvent::ResubmitForApproval, HistoryEvent::ReApprove),
    ];

    for (action, expected) in cases {
        let item = ledger.process_event(action, None, None);
        assert_eq!(item.event, expected);
        assert!(item.actor.is_none());
        assert!(item.properties.is_none());
    }
}

#[test]
fn test_process_event_records_actor_and_comment() {
    let (_store, ledger) = ledger();
    let actor = IdentityRef::new("user-1", "Alex");

    let item = ledger.process_event(
        ProcessEvent::Reject,
        Some(actor.clone()),
        Some("needs another pass".to_string()),
    );

    assert_eq!(item.actor, Some(actor));
    let properties = item.properties.expect("comment property");
    assert_eq!(
        properties.get("comment").map(String::as_str),
        Some("needs another pass")
    );
}

/// Store double that rejects the first write with a version conflict and
/// delegates afterwards.
struct ConflictOnceStore {
    inner: MemoryDocumentStore,
    conflicted: AtomicBool,
}

impl ConflictOnceStore {
    fn new() -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            conflicted: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DocumentStore for ConflictOnceStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.inner.get_all(collection).await
    }

    async fn set(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        if !self.conflicted.swap(true, Ordering::SeqCst) {
            return Err(StoreError::VersionConflict {
                collection,
                id: document["id"].as_str().unwrap_or_default().to_string(),
            });
        }
        self.inner.set(collection, document).await
    }
}

#[tokio::test]
async fn test_append_retries_through_one_conflict() {
    let ledger = HistoryLedger::new(Arc::new(ConflictOnceStore::new()));
    let id = CriterionId::new();

    let item = ledger.process_event(ProcessEvent::Complete, None, None);
    let history = ledger
        .create_or_update(&id, item)
        .await
        .expect("retry should absorb a single conflict");

    assert_eq!(history.items.len(), 1);
}

/// Store double whose writes always conflict.
struct AlwaysConflictStore {
    inner: MemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for AlwaysConflictStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.inner.get_all(collection).await
    }

    async fn set(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        Err(StoreError::VersionConflict {
            collection,
            id: document["id"].as_str().unwrap_or_default().to_string(),
        })
    }
}

#[tokio::test]
async fn test_append_surfaces_a_persistent_conflict() {
    let ledger = HistoryLedger::new(Arc::new(AlwaysConflictStore {
        inner: MemoryDocumentStore::new(),
    }));
    let id = CriterionId::new();

    let item = ledger.process_event(ProcessEvent::Complete, None, None);
    let err = ledger
        .create_or_update(&id, item)
        .await
        .expect_err("persistent conflict must propagate");

    assert!(matches!(err, CriteriaError::Conflict { .. }));
}

/// Store double whose reads fail with a backend error.
struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn get(&self, _collection: Collection, _id: &str) -> Result<Value, StoreError> {
        Err(StoreError::Backend {
            message: "connection reset".to_string(),
        })
    }

    async fn get_all(&self, _collection: Collection) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::Backend {
            message: "connection reset".to_string(),
        })
    }

    async fn set(&self, _collection: Collection, _document: Value) -> Result<Value, StoreError> {
        Err(StoreError::Backend {
            message: "connection reset".to_string(),
        })
    }
}

#[tokio::test]
async fn test_unknown_failure_is_rethrown_wrapped() {
    let ledger = HistoryLedger::new(Arc::new(BrokenStore));
    let id = CriterionId::new();

    let err = ledger
        .get_history(&id)
        .await
        .expect_err("backend failure must surface");

    match err {
        CriteriaError::Storage { context, message } => {
            assert!(context.contains(&id.to_string()));
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected Storage error, got {:?}", other),
    }
}
