//! Domain model for the acceptance-criteria engine.
//!
//! This module provides the strongly typed records the engine persists and
//! mutates:
//!
//! - **Types** (`types.rs`): newtype identifiers, the opaque etag token
//! - **Criterion** (`criterion.rs`): per-item record and details payload
//! - **Document** (`document.rs`): parent document with the rollup projection
//! - **Errors** (`errors.rs`): the engine's error taxonomy
//! - **Services** (`services.rs`): injected clock

pub mod criterion;
pub mod document;
pub mod errors;
pub mod services;
pub mod types;

// Re-export commonly used types for convenience
pub use criterion::{
    ApprovalMark, ChecklistItem, Criterion, CriterionDetails, CriterionKind, CriterionPayload,
    CriterionState, ProcessedMark, ScenarioStep, StepKind, TITLE_MAX_CHARS, TITLE_MIN_CHARS,
};
pub use document::{CriteriaDocument, FullCriteriaStatus};
pub use errors::CriteriaError;
pub use services::EngineClock;
pub use types::{CriterionId, Etag, IdentityRef, TimestampUtc, WorkItemId};
