//! Lookthrough Model - Typed data model for look-through propagation
//!
//! Explicit typed structures for the three-tier ownership hierarchy
//! (fund -> portfolio company -> project) and their sustainability metric
//! snapshots:
//! - Identifier newtypes for each entity tier
//! - An open metric map with an explicit `Undetermined` sentinel
//! - Metric-kind dispatch (weighted average / weighted sum / intensity)
//! - Weighted holding references between tiers

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod entities;
pub mod ids;
pub mod metrics;
pub mod snapshot;

// Re-exports for convenience
pub use entities::{Company, EntityKind, EntityRef, Fund, Holding, Project, Scope};
pub use ids::{CompanyId, FundId, PassId, ProjectId};
pub use metrics::{MetricKey, MetricKind, MetricValue, WEIGHT_SUM_TOLERANCE};
pub use snapshot::MetricSnapshot;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the look-through data model
    pub use crate::{
        Company, CompanyId, EntityKind, EntityRef, Fund, FundId, Holding, MetricKey, MetricKind,
        MetricSnapshot, MetricValue, PassId, Project, ProjectId, Scope,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
