//! Criteria aggregate: the authoritative in-memory projection of criteria
//! documents for a scope, and the single mediator for every mutation.
//!
//! All mutations follow the same sequence: apply the change to a copy of the
//! cached document, persist through the injected store, replace the cached
//! entry with the store's response (fresh etag), then fire the change
//! notification. The aggregate performs zero automatic retries on version
//! conflicts; callers reload and reapply.
//!
//! One aggregate instance assumes exclusive mutation; wrap it in
//! [`actor::CriteriaActor`] to serialize interleaved async callers.

pub mod actor;

pub use actor::{spawn_criteria_actor, CriteriaActor, CriteriaActorArgs, CriteriaMessage};

use crate::domain::criterion::{
    Criterion, CriterionDetails, CriterionPayload, ProcessedMark,
};
use crate::domain::document::CriteriaDocument;
use crate::domain::errors::CriteriaError;
use crate::domain::services::EngineClock;
use crate::domain::types::{CriterionId, IdentityRef, WorkItemId};
use crate::state_machine::{CriterionStateMachine, ProcessEvent};
use crate::store::{get_all_docs, get_doc, set_doc, Collection, DocumentStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Change-notification callback. Invoked synchronously with the full cached
/// snapshot after each persisted mutation; single subscriber, replaced by
/// every `load`.
pub type ChangeSubscriber = Box<dyn Fn(&[CriteriaDocument]) + Send + Sync>;

/// Completion toggle applied by the owning user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionToggle {
    /// Mark the criterion done.
    Complete,
    /// Take a done (or queued) criterion back to `New`.
    Undo,
}

/// In-memory projection of criteria documents, mediated through a store.
pub struct CriteriaAggregate {
    store: Arc<dyn DocumentStore>,
    clock: EngineClock,
    documents: Vec<CriteriaDocument>,
    scope: Option<WorkItemId>,
    initialized: bool,
    subscriber: Option<ChangeSubscriber>,
}

impl CriteriaAggregate {
    /// Creates an uninitialized aggregate over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: EngineClock,
            documents: Vec::new(),
            scope: None,
            initialized: false,
            subscriber: None,
        }
    }

    /// Loads the criteria documents for a scope.
    ///
    /// Memoized: once initialized, a `force == false` call returns the cached
    /// snapshot without touching the store. A missing scope degrades to an
    /// empty list. In every path `on_change` replaces the previous subscriber
    /// and is invoked once, synchronously, with the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Any non-`NotFound` store failure, wrapped with the scope.
    pub async fn load(
        &mut self,
        on_change: ChangeSubscriber,
        scope: Option<WorkItemId>,
        force: bool,
    ) -> Result<Vec<CriteriaDocument>, CriteriaError> {
        if self.initialized && !force {
            self.subscriber = Some(on_change);
            self.notify();
            return Ok(self.documents.clone());
        }

        let documents = match &scope {
            Some(owner) => {
                match get_doc::<CriteriaDocument>(
                    self.store.as_ref(),
                    Collection::Criterias,
                    owner.as_str(),
                )
                .await
                {
                    Ok(document) => vec![document],
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(work_item = %owner, "no criterias stored yet");
                        Vec::new()
                    }
                    Err(e) => {
                        return Err(CriteriaError::from_store(
                            format!("loading criterias for work item {}", owner),
                            e,
                        ))
                    }
                }
            }
            None => get_all_docs(self.store.as_ref(), Collection::Criterias)
                .await
                .map_err(|e| CriteriaError::from_store("loading all criterias", e))?,
        };

        self.documents = documents;
        self.scope = scope;
        self.initialized = true;
        self.subscriber = Some(on_change);
        self.notify();
        Ok(self.documents.clone())
    }

    /// Adds a criterion to its owner's document, or updates it in place when
    /// the id is already present. Creates the document on the owner's first
    /// criterion. Recomputes the rollup, persists, updates the cache, and
    /// fires the change notification.
    pub async fn create_or_update(
        &mut self,
        owner: &WorkItemId,
        criterion: Criterion,
    ) -> Result<CriteriaDocument, CriteriaError> {
        let updated = match self.documents.iter().position(|d| d.id() == owner) {
            Some(index) => {
                let mut document = self.documents[index].clone();
                document.upsert(criterion);
                let persisted = self.persist(document).await?;
                self.documents[index] = persisted.clone();
                persisted
            }
            None => {
                let document = CriteriaDocument::new(owner.clone(), criterion);
                let persisted = self.persist(document).await?;
                self.documents.push(persisted.clone());
                persisted
            }
        };

        self.notify();
        Ok(updated)
    }

    /// Removes a criterion from whichever cached document owns it.
    ///
    /// Returns `None` when no cached document owns the id; otherwise the
    /// persisted document after removal.
    pub async fn delete_criteria(
        &mut self,
        id: &CriterionId,
    ) -> Result<Option<CriteriaDocument>, CriteriaError> {
        let Some(index) = self.documents.iter().position(|d| d.contains(id)) else {
            tracing::debug!(criterion_id = %id, "delete requested for unknown criterion");
            return Ok(None);
        };

        let mut document = self.documents[index].clone();
        document.remove(id);
        let persisted = self.persist(document).await?;
        self.documents[index] = persisted.clone();
        self.notify();
        Ok(Some(persisted))
    }

    /// Applies a completion toggle to a criterion through the state machine,
    /// then persists and notifies exactly like [`Self::create_or_update`].
    ///
    /// Marking done routes through `AwaitingApproval` when the criterion has
    /// a required approver. Undo clears the completion stamp and any recorded
    /// approver mark.
    pub async fn toggle_completion(
        &mut self,
        id: &CriterionId,
        toggle: CompletionToggle,
    ) -> Result<CriteriaDocument, CriteriaError> {
        let event = match toggle {
            CompletionToggle::Complete => ProcessEvent::Complete,
            CompletionToggle::Undo => ProcessEvent::ResetToNew,
        };

        let document = self.apply_transition(id, event).await?;
        if event == ProcessEvent::ResetToNew {
            self.clear_processed(id).await?;
        }
        Ok(document)
    }

    /// Applies an approver action to a criterion. Approve and Reject stamp
    /// the details document's `processed` mark with the acting identity.
    pub async fn process_criterion(
        &mut self,
        id: &CriterionId,
        event: ProcessEvent,
        actor: &IdentityRef,
    ) -> Result<CriteriaDocument, CriteriaError> {
        let document = self.apply_transition(id, event).await?;

        match event {
            ProcessEvent::Approve | ProcessEvent::Reject => {
                self.stamp_processed(id, actor).await?;
            }
            ProcessEvent::ResetToNew => {
                self.clear_processed(id).await?;
            }
            ProcessEvent::Complete | ProcessEvent::ResubmitForApproval => {}
        }

        Ok(document)
    }

    /// Loads the details document for a criterion.
    ///
    /// # Errors
    ///
    /// `CriteriaError::DocumentNotFound` when no details are stored; this
    /// passthrough does not degrade.
    pub async fn get_criteria_details(
        &self,
        id: &CriterionId,
    ) -> Result<CriterionDetails, CriteriaError> {
        get_doc(
            self.store.as_ref(),
            Collection::CriteriaDetails,
            &id.to_string(),
        )
        .await
        .map_err(|e| CriteriaError::from_store(format!("loading details for criterion {}", id), e))
    }

    /// Persists a details document, enforcing the payload/kind invariant
    /// against the cached criterion when it is present.
    pub async fn set_criteria_details(
        &self,
        details: &CriterionDetails,
    ) -> Result<CriterionDetails, CriteriaError> {
        if let Some(criterion) = self.documents.iter().find_map(|d| d.find(&details.id)) {
            details.ensure_matches(criterion)?;
        }

        set_doc(self.store.as_ref(), Collection::CriteriaDetails, details)
            .await
            .map_err(|e| {
                CriteriaError::from_store(
                    format!("persisting details for criterion {}", details.id),
                    e,
                )
            })
    }

    /// Returns the cached documents.
    pub fn documents(&self) -> &[CriteriaDocument] {
        &self.documents
    }

    /// Returns true once `load` has populated the cache.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the scope the cache was loaded for.
    pub fn scope(&self) -> Option<&WorkItemId> {
        self.scope.as_ref()
    }

    async fn apply_transition(
        &mut self,
        id: &CriterionId,
        event: ProcessEvent,
    ) -> Result<CriteriaDocument, CriteriaError> {
        let Some(index) = self.documents.iter().position(|d| d.contains(id)) else {
            return Err(CriteriaError::CriterionNotFound { id: id.clone() });
        };

        let now = self.clock.now();
        let mut document = self.documents[index].clone();
        let transition = match document
            .with_criterion(id, |criterion| {
                CriterionStateMachine::apply(criterion, event, now)
            }) {
            Some(result) => result?,
            None => return Err(CriteriaError::CriterionNotFound { id: id.clone() }),
        };

        tracing::info!(
            criterion_id = %transition.criterion_id,
            from = %transition.from,
            to = %transition.to,
            event = %event,
            "criterion transition"
        );

        let persisted = self.persist(document).await?;
        self.documents[index] = persisted.clone();
        self.notify();
        Ok(persisted)
    }

    /// Records the acting approver on the criterion's details document. A
    /// missing details document degrades to a fresh empty payload of the
    /// criterion's kind so the approver action is never lost.
    async fn stamp_processed(
        &self,
        id: &CriterionId,
        actor: &IdentityRef,
    ) -> Result<(), CriteriaError> {
        let mut details = match self.get_criteria_details(id).await {
            Ok(details) => details,
            Err(CriteriaError::DocumentNotFound { .. }) => {
                let kind = self
                    .documents
                    .iter()
                    .find_map(|d| d.find(id))
                    .map(|c| c.kind)
                    .unwrap_or(crate::domain::criterion::CriterionKind::Text);
                tracing::warn!(criterion_id = %id, "no details stored, recording approver on a fresh payload");
                CriterionDetails::new(id.clone(), CriterionPayload::empty(kind))
            }
            Err(e) => return Err(e),
        };

        details.processed = Some(ProcessedMark {
            processed_by: actor.clone(),
            processed_at: self.clock.now(),
        });

        set_doc(self.store.as_ref(), Collection::CriteriaDetails, &details)
            .await
            .map_err(|e| {
                CriteriaError::from_store(format!("recording approver for criterion {}", id), e)
            })?;
        Ok(())
    }

    /// Clears a recorded approver mark when a criterion returns to `New`.
    /// Nothing to clear is not a failure.
    async fn clear_processed(&self, id: &CriterionId) -> Result<(), CriteriaError> {
        let mut details = match self.get_criteria_details(id).await {
            Ok(details) => details,
            Err(CriteriaError::DocumentNotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };

        if details.processed.is_none() {
            return Ok(());
        }

        details.processed = None;
        set_doc(self.store.as_ref(), Collection::CriteriaDetails, &details)
            .await
            .map_err(|e| {
                CriteriaError::from_store(format!("clearing approver for criterion {}", id), e)
            })?;
        Ok(())
    }

    async fn persist(
        &self,
        document: CriteriaDocument,
    ) -> Result<CriteriaDocument, CriteriaError> {
        set_doc(self.store.as_ref(), Collection::Criterias, &document)
            .await
            .map_err(|e| {
                CriteriaError::from_store(
                    format!("persisting criterias for work item {}", document.id()),
                    e,
                )
            })
    }

    fn notify(&self) {
        if let Some(subscriber) = &self.subscriber {
            subscriber(&self.documents);
        }
    }
}

#[cfg(test)]
#[path = "tests/aggregate_tests.rs"]
mod tests;
