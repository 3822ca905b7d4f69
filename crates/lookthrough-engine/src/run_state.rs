//! Run-lifecycle state machine.
//!
//! `Pending -> Resolving -> Aggregating -> Persisting -> Validating ->
//! Completed`, with `Failed` reachable only from the phases where the store
//! can turn out to be unreachable. Per-entity errors never transition a run
//! to `Failed`; they ride along as report entries.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of one propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Resolving,
    Aggregating,
    Persisting,
    Validating,
    Completed,
    Failed,
}

/// Illegal lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal run state transition: {from:?} -> {to:?}")]
pub struct StateMachineError {
    pub from: RunState,
    pub to: RunState,
}

/// States reachable from `from` in one step.
#[must_use]
pub fn allowed_transitions(from: RunState) -> Vec<RunState> {
    use RunState::*;
    match from {
        Pending => vec![Resolving, Failed],
        Resolving => vec![Aggregating, Failed],
        Aggregating => vec![Persisting],
        Persisting => vec![Validating],
        Validating => vec![Completed],
        Completed | Failed => vec![],
    }
}

/// Validate a single transition.
///
/// # Errors
/// `StateMachineError` when `to` is not reachable from `from`.
pub fn validate_transition(from: RunState, to: RunState) -> Result<(), StateMachineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateMachineError { from, to })
    }
}
