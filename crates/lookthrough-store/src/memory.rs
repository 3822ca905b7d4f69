//! In-memory reference store.
//!
//! One concurrent map of documents keyed by entity id, tagged by tier. Used
//! by the CLI (fed from a JSON dataset) and throughout the test suites.
//! Failure injection covers the two store-side error paths the engine must
//! survive: rejected per-entity writes and an unreachable store.

use crate::error::StoreError;
use crate::gateway::EntityStore;
use dashmap::DashMap;
use lookthrough_model::{
    Company, CompanyId, EntityKind, EntityRef, Fund, FundId, MetricSnapshot, Project, ProjectId,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// A stored document: one entity of any tier under a single key space.
///
/// A single key space is what makes kind mismatches observable - a company
/// holding that points at another company's id is caught by the tag check in
/// the typed getters, mirroring the loosely-typed source store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Fund(Fund),
    Company(Company),
    Project(Project),
}

impl Document {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Fund(_) => EntityKind::Fund,
            Self::Company(_) => EntityKind::Company,
            Self::Project(_) => EntityKind::Project,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Fund(f) => f.id.as_str(),
            Self::Company(c) => c.id.as_str(),
            Self::Project(p) => p.id.as_str(),
        }
    }
}

/// Concurrent in-memory document store.
#[derive(Debug)]
pub struct MemoryStore {
    documents: DashMap<String, Document>,
    /// Entity ids whose snapshot writes are rejected (test hook).
    failing_writes: RwLock<HashSet<String>>,
    /// When false, every call fails with `StoreError::Unavailable`.
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            failing_writes: RwLock::new(HashSet::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn insert_fund(&self, fund: Fund) {
        self.documents
            .insert(fund.id.as_str().to_string(), Document::Fund(fund));
    }

    pub fn insert_company(&self, company: Company) {
        self.documents
            .insert(company.id.as_str().to_string(), Document::Company(company));
    }

    pub fn insert_project(&self, project: Project) {
        self.documents
            .insert(project.id.as_str().to_string(), Document::Project(project));
    }

    /// Reject future snapshot writes for this entity id.
    pub fn fail_writes_for(&self, id: impl Into<String>) {
        self.failing_writes.write().insert(id.into());
    }

    /// Toggle store reachability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Fetch a raw document (test/CLI inspection).
    #[must_use]
    pub fn document(&self, id: &str) -> Option<Document> {
        self.documents.get(id).map(|d| d.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store marked offline".to_string()))
        }
    }

    fn lookup(&self, kind: EntityKind, id: &str) -> Result<Document, StoreError> {
        let doc = self.documents.get(id).ok_or_else(|| StoreError::NotFound {
            kind,
            id: id.to_string(),
        })?;
        if doc.kind() != kind {
            return Err(StoreError::KindMismatch {
                id: id.to_string(),
                expected: kind,
                actual: doc.kind(),
            });
        }
        Ok(doc.clone())
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryStore {
    async fn list_funds(&self) -> Result<Vec<FundId>, StoreError> {
        self.check_available()?;
        let mut ids: Vec<FundId> = self
            .documents
            .iter()
            .filter_map(|entry| match entry.value() {
                Document::Fund(f) => Some(f.id.clone()),
                _ => None,
            })
            .collect();
        // DashMap iteration order is arbitrary; runs must be deterministic.
        ids.sort();
        Ok(ids)
    }

    async fn get_fund(&self, id: &FundId) -> Result<Fund, StoreError> {
        self.check_available()?;
        match self.lookup(EntityKind::Fund, id.as_str())? {
            Document::Fund(f) => Ok(f),
            _ => unreachable!("lookup checked the kind tag"),
        }
    }

    async fn get_company(&self, id: &CompanyId) -> Result<Company, StoreError> {
        self.check_available()?;
        match self.lookup(EntityKind::Company, id.as_str())? {
            Document::Company(c) => Ok(c),
            _ => unreachable!("lookup checked the kind tag"),
        }
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Project, StoreError> {
        self.check_available()?;
        match self.lookup(EntityKind::Project, id.as_str())? {
            Document::Project(p) => Ok(p),
            _ => unreachable!("lookup checked the kind tag"),
        }
    }

    async fn save_snapshot(
        &self,
        entity: &EntityRef,
        snapshot: MetricSnapshot,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        if self.failing_writes.read().contains(&entity.id) {
            return Err(StoreError::WriteRejected {
                id: entity.id.clone(),
                reason: "injected write failure".to_string(),
            });
        }

        let mut doc = self
            .documents
            .get_mut(&entity.id)
            .ok_or_else(|| StoreError::NotFound {
                kind: entity.kind,
                id: entity.id.clone(),
            })?;

        if doc.kind() != entity.kind {
            return Err(StoreError::KindMismatch {
                id: entity.id.clone(),
                expected: entity.kind,
                actual: doc.kind(),
            });
        }

        tracing::debug!(entity = %entity, "persisting snapshot");
        match doc.value_mut() {
            Document::Fund(f) => f.sustainability_metrics = snapshot,
            Document::Company(c) => c.sustainability_metrics = snapshot,
            Document::Project(p) => p.sustainability_metrics = snapshot,
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookthrough_model::MetricKey;

    fn store_with_one_of_each() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_fund(Fund {
            id: FundId::new("f-1"),
            name: "Fund".to_string(),
            total_aum: 100.0,
            currency: "USD".to_string(),
            holdings: vec![],
            sustainability_metrics: MetricSnapshot::new(),
        });
        store.insert_company(Company {
            id: CompanyId::new("c-1"),
            name: "Co".to_string(),
            sector: "energy".to_string(),
            stage: "growth".to_string(),
            annual_revenue: None,
            holdings: vec![],
            sustainability_metrics: MetricSnapshot::new(),
        });
        store.insert_project(Project {
            id: ProjectId::new("p-1"),
            name: "Proj".to_string(),
            project_type: "solar".to_string(),
            status: "active".to_string(),
            budget: 1.0,
            sustainability_metrics: MetricSnapshot::new(),
        });
        store
    }

    #[tokio::test]
    async fn typed_getters_check_the_kind_tag() {
        let store = store_with_one_of_each();

        assert!(store.get_fund(&FundId::new("f-1")).await.is_ok());

        // A company reference pointing at a project id is a kind mismatch.
        let err = store.get_company(&CompanyId::new("p-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));

        let err = store.get_project(&ProjectId::new("missing")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn save_snapshot_overwrites_in_place() {
        let store = store_with_one_of_each();
        let snapshot = MetricSnapshot::new().with(MetricKey::ESG_COMPOSITE, 61.0);

        store
            .save_snapshot(&EntityRef::company(&CompanyId::new("c-1")), snapshot.clone())
            .await
            .unwrap();

        let company = store.get_company(&CompanyId::new("c-1")).await.unwrap();
        assert_eq!(company.sustainability_metrics, snapshot);
    }

    #[tokio::test]
    async fn injected_write_failures_reject_only_that_entity() {
        let store = store_with_one_of_each();
        store.fail_writes_for("c-1");

        let err = store
            .save_snapshot(
                &EntityRef::company(&CompanyId::new("c-1")),
                MetricSnapshot::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { .. }));

        // Sibling writes proceed.
        store
            .save_snapshot(&EntityRef::fund(&FundId::new("f-1")), MetricSnapshot::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn offline_store_fails_everything() {
        let store = store_with_one_of_each();
        store.set_available(false);

        assert!(store.ping().await.unwrap_err().is_unavailable());
        assert!(store.list_funds().await.unwrap_err().is_unavailable());

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn list_funds_is_sorted() {
        let store = store_with_one_of_each();
        store.insert_fund(Fund {
            id: FundId::new("a-fund"),
            name: "A".to_string(),
            total_aum: 1.0,
            currency: "USD".to_string(),
            holdings: vec![],
            sustainability_metrics: MetricSnapshot::new(),
        });

        let ids = store.list_funds().await.unwrap();
        assert_eq!(ids, vec![FundId::new("a-fund"), FundId::new("f-1")]);
    }
}
