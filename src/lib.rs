//! Acceptance-criteria lifecycle and document synchronization engine.
//!
//! This crate is the core behind a work-item acceptance-criteria tracker:
//!
//! - **State machine** (`state_machine`): legal per-criterion states and the
//!   transitions triggered by completion and approval actions, including the
//!   conditional routing through "awaiting approval" when an approver is
//!   required.
//! - **Aggregate** (`aggregate`): the in-memory projection of criteria
//!   documents, the rollup of per-criterion states into one parent status,
//!   and the single-subscriber change notification. An actor wrapper
//!   serializes interleaved async mutations per instance.
//! - **History** (`history`): append-only per-criterion event ledger.
//! - **Store** (`store`): the optimistic-concurrency document store contract
//!   the engine persists through, with in-memory and file-backed
//!   implementations.
//!
//! Rendering, host integration, and transport are out of scope; they are
//! callers of this crate.

pub mod aggregate;
pub mod domain;
pub mod history;
pub mod state_machine;
pub mod store;

// Re-export commonly used types for convenience
pub use aggregate::{
    spawn_criteria_actor, ChangeSubscriber, CompletionToggle, CriteriaActor, CriteriaActorArgs,
    CriteriaAggregate, CriteriaMessage,
};
pub use domain::{
    ApprovalMark, ChecklistItem, CriteriaDocument, CriteriaError, Criterion, CriterionDetails,
    CriterionId, CriterionKind, CriterionPayload, CriterionState, EngineClock, Etag,
    FullCriteriaStatus, IdentityRef, ProcessedMark, ScenarioStep, StepKind, TimestampUtc,
    WorkItemId,
};
pub use history::{HistoryDocument, HistoryEvent, HistoryItem, HistoryLedger};
pub use state_machine::{CriterionStateMachine, ProcessEvent, TransitionEvent};
pub use store::{Collection, DocumentStore, FileDocumentStore, MemoryDocumentStore, StoreError};
