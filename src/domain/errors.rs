//! Error types for the criteria engine.

use crate::domain::criterion::{CriterionKind, CriterionState};
use crate::domain::types::CriterionId;
use crate::state_machine::ProcessEvent;
use crate::store::StoreError;
use std::fmt::{Display, Formatter};

/// Errors that can occur during criteria operations.
#[derive(Debug, Clone)]
pub enum CriteriaError {
    /// Title failed creation-time validation.
    InvalidTitle { message: String },
    /// Mutation addressed a criterion no cached document owns.
    CriterionNotFound { id: CriterionId },
    /// State-machine transition invalid for the criterion's current state.
    InvalidTransition {
        from: CriterionState,
        event: ProcessEvent,
    },
    /// Details payload shape does not match the owning criterion's kind.
    DetailsMismatch {
        id: CriterionId,
        expected: CriterionKind,
        actual: CriterionKind,
    },
    /// Document absent for a given key. Only surfaced by passthrough reads;
    /// load and history paths recover it into an empty default instead.
    DocumentNotFound { collection: String, id: String },
    /// Write rejected due to a stale version token (concurrent modification).
    Conflict { collection: String, id: String },
    /// Any other adapter failure, wrapped with operation context.
    Storage { context: String, message: String },
}

impl CriteriaError {
    /// Maps a store failure into the engine's taxonomy, keeping the kinds
    /// distinguishable and attaching operation context to unknown failures.
    pub fn from_store(context: impl Into<String>, error: StoreError) -> Self {
        match error {
            StoreError::NotFound { collection, id } => Self::DocumentNotFound {
                collection: collection.name().to_string(),
                id,
            },
            StoreError::VersionConflict { collection, id } => Self::Conflict {
                collection: collection.name().to_string(),
                id,
            },
            StoreError::Backend { message } => Self::Storage {
                context: context.into(),
                message,
            },
        }
    }
}

impl Display for CriteriaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle { message } => write!(f, "invalid title: {}", message),
            Self::CriterionNotFound { id } => write!(f, "criterion not found: {}", id),
            Self::InvalidTransition { from, event } => {
                write!(f, "cannot apply {} to a criterion in state {}", event, from)
            }
            Self::DetailsMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "details for criterion {} have payload {}, expected {}",
                id, actual, expected
            ),
            Self::DocumentNotFound { collection, id } => {
                write!(f, "no {} document stored for {}", collection, id)
            }
            Self::Conflict { collection, id } => {
                write!(f, "concurrent modification of {} document {}", collection, id)
            }
            Self::Storage { context, message } => {
                write!(f, "storage failure while {}: {}", context, message)
            }
        }
    }
}

impl std::error::Error for CriteriaError {}
