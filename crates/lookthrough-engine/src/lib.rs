//! Lookthrough Engine - Propagation orchestrator
//!
//! Drives one look-through propagation run end to end:
//! 1. Resolve the run scope into a dependency-ordered plan
//! 2. Aggregate snapshots bottom-up (projects -> companies -> funds),
//!    staging results in memory under a single pass id
//! 3. Persist staged snapshots, one independent write per entity
//! 4. Audit the results with the consistency validator
//! 5. Return a structured run report
//!
//! Per-entity problems (missing references, rejected writes, data-quality
//! findings) accumulate in the report and never abort the run; only a store
//! that is unreachable at run start is fatal. Runs over the same fund are
//! serialized by per-fund locks; runs over disjoint funds need no
//! coordination.
//!
//! # Example
//!
//! ```rust,ignore
//! use lookthrough_engine::PropagationEngine;
//! use lookthrough_model::Scope;
//! use lookthrough_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read_to_string("dataset.json")?;
//! let store = Arc::new(MemoryStore::from_json_str(&raw)?);
//! let engine = PropagationEngine::new(store);
//! let report = engine.propagate(&Scope::All).await?;
//! println!("{}", report.generate_text());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod engine;
pub mod error;
pub mod report;
pub mod run_state;
pub mod validator;

// Re-exports for convenience
pub use engine::PropagationEngine;
pub use error::EngineError;
pub use report::{RunReport, WriteFailure};
pub use run_state::{RunState, StateMachineError};
pub use validator::{ConsistencyValidator, Finding, FindingKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
