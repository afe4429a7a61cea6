//! Lifecycle actions that drive criterion state transitions.
//!
//! The state machine validates each action against the criterion's current
//! state and rejects anything outside the transition table.

use serde::{Deserialize, Serialize};

/// An action applied to a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessEvent {
    /// Approver accepts a criterion awaiting approval.
    Approve,
    /// Approver rejects a criterion awaiting approval.
    Reject,
    /// Mark a criterion done; routes through `AwaitingApproval` when an
    /// approver is required.
    Complete,
    /// Reset a non-`New` criterion back to `New`, clearing its stamps.
    ResetToNew,
    /// Send a rejected criterion back to the approval queue.
    ResubmitForApproval,
}

impl ProcessEvent {
    /// Returns a human-readable label for this action.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessEvent::Approve => "Approve",
            ProcessEvent::Reject => "Reject",
            ProcessEvent::Complete => "Complete",
            ProcessEvent::ResetToNew => "Reset To New",
            ProcessEvent::ResubmitForApproval => "Resubmit For Approval",
        }
    }
}

impl std::fmt::Display for ProcessEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
