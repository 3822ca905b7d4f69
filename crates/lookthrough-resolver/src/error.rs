//! Resolution error taxonomy.
//!
//! Per-reference problems (missing entity, wrong tier) are not errors at this
//! level - they become skip records on the plan. Only conditions that leave
//! the resolver with nothing useful to return are errors.

use lookthrough_model::FundId;
use lookthrough_store::StoreError;

/// Fatal resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolutionError {
    /// The store is unreachable; nothing can be resolved.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The scope names a fund that does not exist.
    #[error("fund not found: {0}")]
    FundNotFound(FundId),

    /// Listing the fund catalog failed for a reason other than availability.
    #[error("listing funds failed: {0}")]
    ListFailed(String),
}

impl ResolutionError {
    /// Classify a store error met while resolving a scoped fund.
    pub(crate) fn from_fund_fetch(err: StoreError, id: &FundId) -> Self {
        match err {
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            _ => Self::FundNotFound(id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookthrough_model::EntityKind;

    #[test]
    fn unavailable_maps_to_store_unavailable() {
        let err = ResolutionError::from_fund_fetch(
            StoreError::Unavailable("down".to_string()),
            &FundId::new("f"),
        );
        assert!(matches!(err, ResolutionError::StoreUnavailable(_)));
    }

    #[test]
    fn not_found_maps_to_fund_not_found() {
        let err = ResolutionError::from_fund_fetch(
            StoreError::NotFound {
                kind: EntityKind::Fund,
                id: "f".to_string(),
            },
            &FundId::new("f"),
        );
        assert!(matches!(err, ResolutionError::FundNotFound(_)));
    }
}
