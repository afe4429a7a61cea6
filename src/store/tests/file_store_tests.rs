//! Tests for the file-backed document store.

use super::*;
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn test_set_then_get_round_trips() {
    let dir = tempdir().expect("temp dir");
    let store = FileDocumentStore::new(dir.path());

    let stored = store
        .set(
            Collection::Criterias,
            json!({"id": "42", "__etag": -1, "state": "new"}),
        )
        .await
        .expect("create should succeed");
    assert_eq!(stored["__etag"], 1);

    let loaded = store
        .get(Collection::Criterias, "42")
        .await
        .expect("get should succeed");
    assert_eq!(loaded, stored);
}

#[tokio::test]
async fn test_get_from_empty_root_is_not_found() {
    let dir = tempdir().expect("temp dir");
    let store = FileDocumentStore::new(dir.path());

    let err = store
        .get(Collection::Criterias, "42")
        .await
        .expect_err("nothing stored yet");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_stale_write_conflicts() {
    let dir = tempdir().expect("temp dir");
    let store = FileDocumentStore::new(dir.path());

    let stored = store
        .set(Collection::History, json!({"id": "h1", "__etag": -1}))
        .await
        .expect("create should succeed");

    // A second writer with the original token must be rejected
    let err = store
        .set(Collection::History, json!({"id": "h1", "__etag": -1}))
        .await
        .expect_err("stale write");
    assert!(matches!(err, StoreError::VersionConflict { .. }));

    // The fresh token still writes
    let updated = store
        .set(Collection::History, stored)
        .await
        .expect("fresh token should write");
    assert_eq!(updated["__etag"], 2);
}

#[tokio::test]
async fn test_get_all_reads_every_document() {
    let dir = tempdir().expect("temp dir");
    let store = FileDocumentStore::new(dir.path());

    for id in ["b", "a", "c"] {
        store
            .set(Collection::Criterias, json!({"id": id, "__etag": -1}))
            .await
            .expect("create should succeed");
    }

    let documents = store
        .get_all(Collection::Criterias)
        .await
        .expect("read should succeed");
    let ids: Vec<&str> = documents
        .iter()
        .map(|d| d["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let dir = tempdir().expect("temp dir");
    let store = FileDocumentStore::new(dir.path());

    store
        .set(Collection::Criterias, json!({"id": "42", "__etag": -1}))
        .await
        .expect("create should succeed");

    let err = store
        .get(Collection::History, "42")
        .await
        .expect_err("other collection");
    assert!(err.is_not_found());
    assert!(store
        .get_all(Collection::History)
        .await
        .expect("empty collection")
        .is_empty());
}

#[tokio::test]
async fn test_store_survives_reopen() {
    let dir = tempdir().expect("temp dir");

    {
        let store = FileDocumentStore::new(dir.path());
        store
            .set(Collection::Criterias, json!({"id": "42", "__etag": -1}))
            .await
            .expect("create should succeed");
    }

    let reopened = FileDocumentStore::new(dir.path());
    let loaded = reopened
        .get(Collection::Criterias, "42")
        .await
        .expect("persisted document");
    assert_eq!(loaded["__etag"], 1);
}
