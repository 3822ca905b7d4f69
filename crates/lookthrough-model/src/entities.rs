//! The three entity tiers and the weighted references between them.
//!
//! Source documents are loosely shaped; these are the explicit typed
//! counterparts. Ownership links are embedded as [`Holding`] references, each
//! parent-child edge carrying its own weight independent of other edges (the
//! same company may sit under several funds with different weights).

use crate::ids::{CompanyId, FundId, ProjectId};
use crate::snapshot::MetricSnapshot;
use serde::{Deserialize, Serialize};

/// Weighted child reference: the fraction of the parent's capital/activity
/// attributable to the target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding<T> {
    pub target: T,
    pub weight: f64,
}

impl<T> Holding<T> {
    #[inline]
    #[must_use]
    pub fn new(target: T, weight: f64) -> Self {
        Self { target, weight }
    }
}

/// An investment fund: the top tier, reporting a derived ESG posture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub id: FundId,
    pub name: String,
    /// Total assets under management, in the fund's reporting currency.
    pub total_aum: f64,
    pub currency: String,
    /// Portfolio-company references, each weighted by the fraction of fund
    /// capital committed to that company.
    #[serde(default)]
    pub holdings: Vec<Holding<CompanyId>>,
    /// Derived snapshot; overwritten by each propagation pass.
    #[serde(default)]
    pub sustainability_metrics: MetricSnapshot,
}

/// A portfolio company: the middle tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub sector: String,
    pub stage: String,
    /// Scale denominator for the company-level carbon-intensity recompute.
    /// Loosely-shaped source documents carry it when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_revenue: Option<f64>,
    /// Project references, each weighted by the fraction of company activity
    /// attributable to that project.
    #[serde(default)]
    pub holdings: Vec<Holding<ProjectId>>,
    /// Derived snapshot; scope 1/2/3 emissions live in the metric map.
    #[serde(default)]
    pub sustainability_metrics: MetricSnapshot,
}

/// A project: the leaf tier. The only tier where metrics are authored, not
/// derived; the engine never overwrites a project snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub project_type: String,
    pub status: String,
    pub budget: f64,
    #[serde(default)]
    pub sustainability_metrics: MetricSnapshot,
}

/// Entity tier tag, used as the document type tag by the store and for
/// reporting which entity a finding or skip refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Fund,
    Company,
    Project,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Fund => "fund",
            Self::Company => "company",
            Self::Project => "project",
        })
    }
}

/// Tier-tagged entity identifier for reports and store writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    #[inline]
    #[must_use]
    pub fn fund(id: &FundId) -> Self {
        Self {
            kind: EntityKind::Fund,
            id: id.0.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn company(id: &CompanyId) -> Self {
        Self {
            kind: EntityKind::Company,
            id: id.0.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn project(id: &ProjectId) -> Self {
        Self {
            kind: EntityKind::Project,
            id: id.0.clone(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Run scope for one propagation invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every fund the store lists.
    All,
    /// A single fund's resolved subtree; nothing outside it is mutated.
    Fund(FundId),
}

impl Fund {
    /// Sum of declared holding weights.
    #[must_use]
    pub fn declared_weight_sum(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }
}

impl Company {
    /// Sum of declared holding weights.
    #[must_use]
    pub fn declared_weight_sum(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }
}
