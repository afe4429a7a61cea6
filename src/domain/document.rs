//! Parent criteria document and the full-status rollup rule.
//!
//! A `CriteriaDocument` owns all criteria for one work item. Its `state`
//! field is a projection of the contained criteria's states and is recomputed
//! by every mutating method; it is never writable on its own.

use crate::domain::criterion::{Criterion, CriterionState};
use crate::domain::types::{CriterionId, Etag, WorkItemId};
use serde::{Deserialize, Serialize};

/// Rollup status of a criteria document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FullCriteriaStatus {
    #[default]
    New,
    Partial,
    Completed,
    Approved,
    Rejected,
}

impl FullCriteriaStatus {
    /// Computes the rollup status from a set of criterion states.
    ///
    /// Pure function of the state multiset, order-independent. Rules are
    /// evaluated in fixed order and the first match wins:
    /// 1. any `New` mixed with anything else is `Partial`; all-`New` is `New`
    /// 2. all remaining `Completed` (no `Approved`/`Rejected`) is `Completed`
    /// 3. any `Approved` with no `Rejected` is `Approved`
    /// 4. any `Rejected` is `Rejected`
    /// 5. everything else (awaiting-approval mixes) is `Partial`
    pub fn roll_up(criterias: &[Criterion]) -> Self {
        if criterias.is_empty() {
            return FullCriteriaStatus::New;
        }

        let has = |state: CriterionState| criterias.iter().any(|c| c.state == state);
        let all = |state: CriterionState| criterias.iter().all(|c| c.state == state);

        if has(CriterionState::New) {
            if all(CriterionState::New) {
                FullCriteriaStatus::New
            } else {
                FullCriteriaStatus::Partial
            }
        } else if all(CriterionState::Completed) {
            FullCriteriaStatus::Completed
        } else if has(CriterionState::Approved) && !has(CriterionState::Rejected) {
            FullCriteriaStatus::Approved
        } else if has(CriterionState::Rejected) {
            FullCriteriaStatus::Rejected
        } else {
            FullCriteriaStatus::Partial
        }
    }

    /// Returns a human-readable label for this status.
    pub fn label(&self) -> &'static str {
        match self {
            FullCriteriaStatus::New => "New",
            FullCriteriaStatus::Partial => "Partially Completed",
            FullCriteriaStatus::Completed => "Completed",
            FullCriteriaStatus::Approved => "Approved",
            FullCriteriaStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for FullCriteriaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parent record owning all criteria for one work item.
///
/// Fields are private so the rollup invariant survives every mutation; use
/// the mutators below, which recompute `state` before returning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaDocument {
    id: WorkItemId,
    criterias: Vec<Criterion>,
    state: FullCriteriaStatus,
    #[serde(rename = "__etag", default)]
    etag: Etag,
}

impl CriteriaDocument {
    /// Creates an unpersisted document seeded from a single criterion.
    pub fn new(id: WorkItemId, criterion: Criterion) -> Self {
        let state = FullCriteriaStatus::roll_up(std::slice::from_ref(&criterion));
        Self {
            id,
            criterias: vec![criterion],
            state,
            etag: Etag::UNSET,
        }
    }

    /// Returns the owning work item id.
    pub fn id(&self) -> &WorkItemId {
        &self.id
    }

    /// Returns the contained criteria in display order.
    pub fn criterias(&self) -> &[Criterion] {
        &self.criterias
    }

    /// Returns the current rollup status.
    pub fn state(&self) -> FullCriteriaStatus {
        self.state
    }

    /// Returns the optimistic-concurrency token.
    pub fn etag(&self) -> Etag {
        self.etag
    }

    /// Finds a criterion by id.
    pub fn find(&self, id: &CriterionId) -> Option<&Criterion> {
        self.criterias.iter().find(|c| &c.id == id)
    }

    /// Returns true if this document owns the given criterion.
    pub fn contains(&self, id: &CriterionId) -> bool {
        self.find(id).is_some()
    }

    /// Updates a criterion in place when its id is already present, appends
    /// it otherwise, then recomputes the rollup.
    pub fn upsert(&mut self, criterion: Criterion) {
        match self.criterias.iter_mut().find(|c| c.id == criterion.id) {
            Some(existing) => *existing = criterion,
            None => self.criterias.push(criterion),
        }
        self.refresh_state();
    }

    /// Removes a criterion by id, recomputing the rollup when found.
    pub fn remove(&mut self, id: &CriterionId) -> Option<Criterion> {
        let index = self.criterias.iter().position(|c| &c.id == id)?;
        let removed = self.criterias.remove(index);
        self.refresh_state();
        Some(removed)
    }

    /// Applies a closure to a criterion by id, then recomputes the rollup.
    /// Returns `None` when the id is not present; the closure's error is
    /// passed through and leaves the document untouched.
    pub fn with_criterion<T, E>(
        &mut self,
        id: &CriterionId,
        apply: impl FnOnce(&mut Criterion) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let criterion = self.criterias.iter_mut().find(|c| &c.id == id)?;
        let result = apply(criterion);
        if result.is_ok() {
            self.refresh_state();
        }
        Some(result)
    }

    fn refresh_state(&mut self) {
        self.state = FullCriteriaStatus::roll_up(&self.criterias);
    }
}

#[cfg(test)]
#[path = "tests/document_tests.rs"]
mod tests;
