//! Lookthrough Store - Entity store gateway
//!
//! Read/write access to the three entity collections (funds, companies,
//! projects) behind a single async trait. The propagation engine only ever
//! talks to [`EntityStore`]; how documents arrived in the store (ingestion,
//! uploads, direct edits) is outside this workspace.
//!
//! Ships an in-memory reference implementation backed by a concurrent
//! document map, with write-failure injection and an availability toggle so
//! the engine's skip-and-continue and fatal paths are testable.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod dataset;
pub mod error;
pub mod gateway;
pub mod memory;

// Re-exports for convenience
pub use dataset::Dataset;
pub use error::StoreError;
pub use gateway::EntityStore;
pub use memory::{Document, MemoryStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
