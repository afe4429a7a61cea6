//! Centralized state machine for criterion lifecycle transitions.
//!
//! This module provides the ONLY place where per-criterion state transitions
//! happen. The state machine validates each action against the criterion's
//! current state, applies the transition, stamps or clears the completion
//! mark, and emits a transition event for logging.

mod commands;
mod events;

pub use commands::ProcessEvent;
pub use events::TransitionEvent;

use crate::domain::criterion::{ApprovalMark, Criterion, CriterionState};
use crate::domain::errors::CriteriaError;
use crate::domain::types::TimestampUtc;

/// The ONLY place criterion state transitions happen.
///
/// Stateless: the criterion carries the state, the machine carries the rules.
pub struct CriterionStateMachine;

impl CriterionStateMachine {
    /// Validates and applies one action to a criterion.
    ///
    /// Returns the applied transition for logging. The criterion is left
    /// untouched when the action is illegal for its current state.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::InvalidTransition` for any `(state, event)`
    /// pair outside the transition table. Out-of-state requests fail fast
    /// rather than silently mutating, since silent acceptance would corrupt
    /// the document rollup.
    pub fn apply(
        criterion: &mut Criterion,
        event: ProcessEvent,
        now: TimestampUtc,
    ) -> Result<TransitionEvent, CriteriaError> {
        use CriterionState::*;

        let from = criterion.state;
        let to = match (from, event) {
            // Marking done routes through the approval queue when an
            // approver is required.
            (New, ProcessEvent::Complete) => {
                criterion.approval = Some(ApprovalMark { completed_at: now });
                if criterion.required_approver.is_some() {
                    AwaitingApproval
                } else {
                    Completed
                }
            }

            // Undo/reset returns any non-New state to New and clears the
            // completion stamp. Approved is re-openable through this path.
            (AwaitingApproval | Completed | Approved | Rejected, ProcessEvent::ResetToNew) => {
                criterion.approval = None;
                New
            }

            (AwaitingApproval, ProcessEvent::Approve) => Approved,
            (AwaitingApproval, ProcessEvent::Reject) => Rejected,

            (Rejected, ProcessEvent::ResubmitForApproval) => AwaitingApproval,

            (from, event) => return Err(CriteriaError::InvalidTransition { from, event }),
        };

        criterion.state = to;

        Ok(TransitionEvent {
            criterion_id: criterion.id.clone(),
            from,
            to,
            event,
        })
    }
}
