//! Criterion model: per-item state, the criterion record, and the
//! type-specific details payload.
//!
//! The details payload is a tagged union (`CriterionPayload`) so that the
//! "exactly one shape, matching the owning criterion's kind" invariant is
//! checked by the compiler instead of by convention.

use crate::domain::errors::CriteriaError;
use crate::domain::types::{CriterionId, Etag, IdentityRef, TimestampUtc};
use serde::{Deserialize, Serialize};

/// Minimum title length in characters, enforced at creation.
pub const TITLE_MIN_CHARS: usize = 4;
/// Maximum title length in characters, enforced at creation.
pub const TITLE_MAX_CHARS: usize = 300;

/// Lifecycle state of a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CriterionState {
    #[default]
    New,
    AwaitingApproval,
    Completed,
    Approved,
    Rejected,
}

impl CriterionState {
    /// Returns a human-readable label for this state.
    pub fn label(&self) -> &'static str {
        match self {
            CriterionState::New => "New",
            CriterionState::AwaitingApproval => "Awaiting Approval",
            CriterionState::Completed => "Completed",
            CriterionState::Approved => "Approved",
            CriterionState::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for CriterionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Shape of a criterion's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    Text,
    Checklist,
    Scenario,
}

impl std::fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CriterionKind::Text => "text",
            CriterionKind::Checklist => "checklist",
            CriterionKind::Scenario => "scenario",
        };
        write!(f, "{}", name)
    }
}

/// Completion stamp recorded when a criterion is marked done.
/// Cleared when the criterion is reset to `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalMark {
    pub completed_at: TimestampUtc,
}

/// Approver stamp recorded once an approver has acted on a criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedMark {
    pub processed_by: IdentityRef,
    pub processed_at: TimestampUtc,
}

/// One acceptance-criteria item attached to a work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub kind: CriterionKind,
    pub title: String,
    pub state: CriterionState,
    pub required_approver: Option<IdentityRef>,
    pub order: Option<i32>,
    pub approval: Option<ApprovalMark>,
}

impl Criterion {
    /// Creates a criterion in state `New` with a validated title.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::InvalidTitle` if the title is empty or outside
    /// the 4-300 character range. The engine does not re-validate titles
    /// after creation.
    pub fn new(
        kind: CriterionKind,
        title: impl Into<String>,
        required_approver: Option<IdentityRef>,
    ) -> Result<Self, CriteriaError> {
        let title = title.into();
        let chars = title.chars().count();
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&chars) {
            return Err(CriteriaError::InvalidTitle {
                message: format!(
                    "title must be {}-{} characters, got {}",
                    TITLE_MIN_CHARS, TITLE_MAX_CHARS, chars
                ),
            });
        }

        Ok(Self {
            id: CriterionId::new(),
            kind,
            title,
            state: CriterionState::New,
            required_approver,
            order: None,
            approval: None,
        })
    }

    /// Sets the display order and returns the criterion.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

/// One independently completable item of a checklist criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub completed: bool,
    pub text: String,
}

/// Step keyword in a Given/When/Then scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Given,
    When,
    Then,
    And,
}

/// One ordered step of a scenario criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub id: String,
    pub kind: StepKind,
    pub text: String,
}

/// Type-specific criterion payload. Exactly one shape is populated and it
/// must match the owning criterion's `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriterionPayload {
    Text {
        description: String,
    },
    Checklist {
        criterias: Vec<ChecklistItem>,
    },
    Scenario {
        scenario: String,
        criterias: Vec<ScenarioStep>,
    },
}

impl CriterionPayload {
    /// Returns the kind tag this payload corresponds to.
    pub fn kind(&self) -> CriterionKind {
        match self {
            CriterionPayload::Text { .. } => CriterionKind::Text,
            CriterionPayload::Checklist { .. } => CriterionKind::Checklist,
            CriterionPayload::Scenario { .. } => CriterionKind::Scenario,
        }
    }

    /// Returns an empty payload of the given kind.
    pub fn empty(kind: CriterionKind) -> Self {
        match kind {
            CriterionKind::Text => CriterionPayload::Text {
                description: String::new(),
            },
            CriterionKind::Checklist => CriterionPayload::Checklist {
                criterias: Vec::new(),
            },
            CriterionKind::Scenario => CriterionPayload::Scenario {
                scenario: String::new(),
                criterias: Vec::new(),
            },
        }
    }
}

/// Stored details document for a criterion, keyed by the criterion id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDetails {
    pub id: CriterionId,
    #[serde(rename = "__etag", default)]
    pub etag: Etag,
    #[serde(flatten)]
    pub payload: CriterionPayload,
    pub processed: Option<ProcessedMark>,
}

impl CriterionDetails {
    /// Creates an unpersisted details document for a criterion.
    pub fn new(id: CriterionId, payload: CriterionPayload) -> Self {
        Self {
            id,
            etag: Etag::UNSET,
            payload,
            processed: None,
        }
    }

    /// Verifies the payload shape matches the owning criterion's kind.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::DetailsMismatch` when the tags differ.
    pub fn ensure_matches(&self, criterion: &Criterion) -> Result<(), CriteriaError> {
        if self.payload.kind() != criterion.kind {
            return Err(CriteriaError::DetailsMismatch {
                id: self.id.clone(),
                expected: criterion.kind,
                actual: self.payload.kind(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/criterion_tests.rs"]
mod tests;
