//! Append-only history ledger for criterion lifecycle events.
//!
//! One history document per criterion, newest entry first. The ledger is a
//! read-merge-write consumer of the document store; concurrent appends are
//! resolved with a bounded retry-on-conflict loop.

use crate::domain::errors::CriteriaError;
use crate::domain::services::EngineClock;
use crate::domain::types::{CriterionId, Etag, IdentityRef, TimestampUtc};
use crate::state_machine::ProcessEvent;
use crate::store::{get_doc, set_doc, Collection, DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded lifecycle transitions. Every `ProcessEvent` maps to exactly one
/// of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    Completed,
    ReOpened,
    Approved,
    Rejected,
    ReApprove,
}

/// One timestamped ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub event: HistoryEvent,
    pub date: TimestampUtc,
    pub actor: Option<IdentityRef>,
    pub properties: Option<HashMap<String, String>>,
}

/// Append-only history document for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub id: CriterionId,
    #[serde(rename = "__etag", default)]
    pub etag: Etag,
    pub items: Vec<HistoryItem>,
}

impl HistoryDocument {
    /// Fresh unpersisted document for a criterion with no recorded history.
    pub fn empty(id: CriterionId) -> Self {
        Self {
            id,
            etag: Etag::UNSET,
            items: Vec::new(),
        }
    }
}

/// Attempts per append before a version conflict is propagated.
pub const APPEND_RETRY_LIMIT: usize = 3;

/// Store-injected ledger for reading and appending history.
pub struct HistoryLedger {
    store: Arc<dyn DocumentStore>,
    clock: EngineClock,
}

impl HistoryLedger {
    /// Creates a ledger over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: EngineClock,
        }
    }

    /// Loads the history for a criterion.
    ///
    /// A missing document degrades to a fresh empty one; it is not a failure.
    ///
    /// # Errors
    ///
    /// Any non-`NotFound` store failure, wrapped with the criterion id.
    pub async fn get_history(&self, id: &CriterionId) -> Result<HistoryDocument, CriteriaError> {
        match get_doc::<HistoryDocument>(self.store.as_ref(), Collection::History, &id.to_string())
            .await
        {
            Ok(document) => Ok(document),
            Err(e) if e.is_not_found() => {
                tracing::debug!(criterion_id = %id, "no history yet, starting fresh");
                Ok(HistoryDocument::empty(id.clone()))
            }
            Err(e) => Err(CriteriaError::from_store(
                format!("loading history for criterion {}", id),
                e,
            )),
        }
    }

    /// Prepends an entry to a criterion's history and persists the merged
    /// document.
    ///
    /// Read-merge-write with a bounded retry: a stale-etag rejection triggers
    /// a re-read and reapply, up to [`APPEND_RETRY_LIMIT`] attempts, after
    /// which the conflict propagates.
    pub async fn create_or_update(
        &self,
        id: &CriterionId,
        item: HistoryItem,
    ) -> Result<HistoryDocument, CriteriaError> {
        let mut attempt = 1;
        loop {
            let mut history = self.get_history(id).await?;
            history.items.insert(0, item.clone());

            match set_doc(self.store.as_ref(), Collection::History, &history).await {
                Ok(updated) => return Ok(updated),
                Err(StoreError::VersionConflict { .. }) if attempt < APPEND_RETRY_LIMIT => {
                    tracing::warn!(
                        criterion_id = %id,
                        attempt,
                        "history append conflicted, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    return Err(CriteriaError::from_store(
                        format!("appending history for criterion {}", id),
                        e,
                    ))
                }
            }
        }
    }

    /// Builds the ledger entry for a lifecycle action.
    ///
    /// Total and side-effect-free mapping; the optional comment travels in
    /// the entry's properties.
    pub fn process_event(
        &self,
        event: ProcessEvent,
        actor: Option<IdentityRef>,
        comment: Option<String>,
    ) -> HistoryItem {
        let event = match event {
            ProcessEvent::Approve => HistoryEvent::Approved,
            ProcessEvent::Reject => HistoryEvent::Rejected,
            ProcessEvent::Complete => HistoryEvent::Completed,
            ProcessEvent::ResetToNew => HistoryEvent::ReOpened,
            ProcessEvent::ResubmitForApproval => HistoryEvent::ReApprove,
        };

        let properties =
            comment.map(|comment| HashMap::from([("comment".to_string(), comment)]));

        HistoryItem {
            event,
            date: self.clock.now(),
            actor,
            properties,
        }
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
