//! Lookthrough Aggregate - Metric combination rules
//!
//! The core algorithm of the propagation engine: deriving a parent's metric
//! snapshot from its weighted children. Everything here is a pure function of
//! (children's snapshots, weights) - deterministic, no I/O, no async - so the
//! same inputs always produce bit-identical output.
//!
//! Three combination kinds, dispatched by [`lookthrough_model::MetricKind`]:
//! - weighted average for scores and percentages
//! - weighted sum for absolute additive quantities
//! - parent-level recompute for carbon intensity (never an average of child
//!   ratios, which distorts results when denominators differ)

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod combine;
pub mod rollup;

// Re-exports for convenience
pub use combine::{recompute_intensity, weighted_average, weighted_sum};
pub use rollup::{aggregate_children, ChildMetrics};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
