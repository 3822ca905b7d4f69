//! Store error taxonomy.

use lookthrough_model::EntityKind;

/// Errors surfaced by an [`crate::EntityStore`] implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No document with this id in the requested collection.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// A reference resolved to a document of the wrong tier. This is how
    /// malformed ownership data (a project "owning" a company) shows up: the
    /// type tag, not graph traversal, detects it.
    #[error("kind mismatch for {id}: expected {expected}, found {actual}")]
    KindMismatch {
        id: String,
        expected: EntityKind,
        actual: EntityKind,
    },

    /// The store refused a snapshot write for this entity.
    #[error("write rejected for {id}: {reason}")]
    WriteRejected { id: String, reason: String },

    /// The store cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether this error means the store as a whole is unreachable
    /// (fatal at run start) rather than a per-entity problem.
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
