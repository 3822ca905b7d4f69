//! Engine error taxonomy.
//!
//! Deliberately small: per-entity problems are report entries, not errors.
//! An `EngineError` means the run produced no results at all.

use crate::run_state::StateMachineError;
use lookthrough_resolver::ResolutionError;

/// Fatal run failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The store was unreachable at run start. The only failure the engine
    /// cannot degrade around.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Scope resolution failed outright (e.g. the scoped fund does not
    /// exist).
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// An illegal lifecycle transition, which indicates an engine bug.
    #[error(transparent)]
    State(#[from] StateMachineError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookthrough_model::FundId;

    #[test]
    fn resolution_errors_convert() {
        let err: EngineError = ResolutionError::FundNotFound(FundId::new("f")).into();
        assert!(matches!(err, EngineError::Resolution(_)));
        assert_eq!(err.to_string(), "fund not found: f");
    }

    #[test]
    fn unavailable_message_names_the_store() {
        let err = EngineError::StoreUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");
    }
}
