//! The entity store gateway trait.

use crate::error::StoreError;
use lookthrough_model::{Company, EntityRef, Fund, FundId, CompanyId, MetricSnapshot, Project, ProjectId};

/// Async read/write access to the fund, company, and project collections.
///
/// Snapshot writes are independent per entity; the engine never asks the
/// store for cross-entity transactions. Reads return owned entities because
/// the gateway boundary is also a process/network boundary in production
/// deployments.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// List every fund id in the store.
    async fn list_funds(&self) -> Result<Vec<FundId>, StoreError>;

    /// Fetch one fund by id.
    async fn get_fund(&self, id: &FundId) -> Result<Fund, StoreError>;

    /// Fetch one company by id.
    ///
    /// # Errors
    /// `StoreError::KindMismatch` when the id resolves to a document of a
    /// different tier (malformed ownership data).
    async fn get_company(&self, id: &CompanyId) -> Result<Company, StoreError>;

    /// Fetch one project by id.
    async fn get_project(&self, id: &ProjectId) -> Result<Project, StoreError>;

    /// Overwrite the entity's `sustainability_metrics` snapshot.
    async fn save_snapshot(
        &self,
        entity: &EntityRef,
        snapshot: MetricSnapshot,
    ) -> Result<(), StoreError>;

    /// Cheap reachability probe, called once at run start.
    async fn ping(&self) -> Result<(), StoreError>;
}
