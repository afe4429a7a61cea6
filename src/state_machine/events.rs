//! Events emitted by the state machine after applying actions.
//!
//! These are for logging and notification purposes only - callers read the
//! criterion itself for the authoritative resulting state.

use crate::domain::criterion::CriterionState;
use crate::domain::types::CriterionId;
use crate::state_machine::ProcessEvent;
use serde::Serialize;

/// A state transition applied to one criterion.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionEvent {
    pub criterion_id: CriterionId,
    pub from: CriterionState,
    pub to: CriterionState,
    pub event: ProcessEvent,
}
