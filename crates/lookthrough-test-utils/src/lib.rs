//! Testing utilities for the lookthrough workspace
//!
//! Shared fixtures: compact entity builders and a populated in-memory store.

#![allow(missing_docs)]

use lookthrough_model::{
    Company, CompanyId, Fund, FundId, Holding, MetricSnapshot, MetricValue, Project, ProjectId,
};
use lookthrough_store::MemoryStore;

/// Fund fixture with weighted company holdings and no metrics yet.
pub fn fund(id: &str, total_aum: f64, holdings: &[(&str, f64)]) -> Fund {
    Fund {
        id: FundId::new(id),
        name: format!("Fund {id}"),
        total_aum,
        currency: "EUR".to_string(),
        holdings: holdings
            .iter()
            .map(|&(target, weight)| Holding::new(CompanyId::new(target), weight))
            .collect(),
        sustainability_metrics: MetricSnapshot::new(),
    }
}

/// Company fixture with weighted project holdings.
pub fn company(id: &str, holdings: &[(&str, f64)]) -> Company {
    Company {
        id: CompanyId::new(id),
        name: format!("Company {id}"),
        sector: "energy".to_string(),
        stage: "growth".to_string(),
        annual_revenue: None,
        holdings: holdings
            .iter()
            .map(|&(target, weight)| Holding::new(ProjectId::new(target), weight))
            .collect(),
        sustainability_metrics: MetricSnapshot::new(),
    }
}

/// Company fixture with a revenue denominator for intensity recomputes.
pub fn company_with_revenue(id: &str, revenue: f64, holdings: &[(&str, f64)]) -> Company {
    Company {
        annual_revenue: Some(revenue),
        ..company(id, holdings)
    }
}

/// Project fixture with authored leaf metrics.
pub fn project(id: &str, metrics: &[(&str, f64)]) -> Project {
    let mut snapshot = MetricSnapshot::new();
    for &(key, value) in metrics {
        snapshot.set(key.into(), MetricValue::Value(value));
    }
    Project {
        id: ProjectId::new(id),
        name: format!("Project {id}"),
        project_type: "renewable_energy".to_string(),
        status: "active".to_string(),
        budget: 1_000_000.0,
        sustainability_metrics: snapshot,
    }
}

/// Builder for a populated [`MemoryStore`].
#[derive(Debug, Default)]
pub struct StoreBuilder {
    store: MemoryStore,
}

impl StoreBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fund(self, fund: Fund) -> Self {
        self.store.insert_fund(fund);
        self
    }

    #[must_use]
    pub fn company(self, company: Company) -> Self {
        self.store.insert_company(company);
        self
    }

    #[must_use]
    pub fn project(self, project: Project) -> Self {
        self.store.insert_project(project);
        self
    }

    #[must_use]
    pub fn build(self) -> MemoryStore {
        self.store
    }
}
