//! Lookthrough Resolver - Hierarchy resolution
//!
//! Materializes the ownership tree for a run scope (one fund or all funds)
//! into an in-memory [`plan::PropagationPlan`]: arena maps of the entities
//! involved plus a dependency DAG whose reverse topological order is the
//! bottom-up aggregation schedule. Shared companies and projects are fetched
//! once and referenced, never refetched per parent.
//!
//! Missing and mistyped references are recorded as skips and excluded from
//! their parent's children; they never abort a run. Only an unreachable
//! store (or a nonexistent fund named explicitly in the scope) is fatal.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod dag;
pub mod error;
pub mod plan;
pub mod resolver;

// Re-exports for convenience
pub use dag::DependencyDag;
pub use error::ResolutionError;
pub use plan::{CompanyNode, FundNode, PropagationPlan, SkipReason, SkippedRef};
pub use resolver::{scope_label, HierarchyResolver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
