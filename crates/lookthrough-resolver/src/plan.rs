//! The propagation plan: arena of resolved entities plus dependency order.

use crate::dag::{DagError, DependencyDag};
use lookthrough_model::{
    Company, CompanyId, EntityRef, Fund, FundId, Holding, Project, ProjectId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A resolved fund and its usable (non-skipped) company edges.
///
/// `fund.holdings` keeps the full declared edge list for weight-sum auditing;
/// `children` holds only the edges whose target actually resolved.
#[derive(Debug, Clone)]
pub struct FundNode {
    pub fund: Fund,
    pub children: Vec<Holding<CompanyId>>,
}

/// A resolved company and its usable project edges. Shared companies appear
/// here exactly once regardless of how many funds hold them.
#[derive(Debug, Clone)]
pub struct CompanyNode {
    pub company: Company,
    pub children: Vec<Holding<ProjectId>>,
}

/// Why a referenced child was excluded from its parent's aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The referenced id has no document in the store.
    MissingEntity,
    /// The referenced document belongs to the wrong tier (malformed
    /// ownership data, e.g. a project "owning" a company).
    KindMismatch,
    /// The edge would close a dependency cycle. The type-tag check makes
    /// this unreachable for three-tier data; it exists so the DAG's
    /// rejection still surfaces as a skip instead of an abort.
    CycleDetected,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MissingEntity => "missing entity",
            Self::KindMismatch => "kind mismatch",
            Self::CycleDetected => "cycle detected",
        })
    }
}

/// One skipped parent-child reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRef {
    pub parent: EntityRef,
    pub child: EntityRef,
    pub reason: SkipReason,
}

/// Dependency-ordered work plan for one propagation run.
///
/// Arena maps keep each entity exactly once (shared subtrees are referenced,
/// not duplicated); the DAG makes bottom-up ordering structural. `BTreeMap`
/// arenas and sorted fund insertion keep plan iteration deterministic.
#[derive(Debug, Default)]
pub struct PropagationPlan {
    pub funds: BTreeMap<FundId, FundNode>,
    pub companies: BTreeMap<CompanyId, CompanyNode>,
    pub projects: BTreeMap<ProjectId, Project>,
    pub skipped: Vec<SkippedRef>,

    dag: DependencyDag,
    index_of: HashMap<EntityRef, u32>,
    entity_of: Vec<EntityRef>,
}

impl PropagationPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an entity as a plan node, returning its dense index.
    pub fn intern(&mut self, entity: EntityRef) -> u32 {
        if let Some(&idx) = self.index_of.get(&entity) {
            return idx;
        }
        #[allow(clippy::cast_possible_truncation)]
        let idx = self.entity_of.len() as u32;
        self.entity_of.push(entity.clone());
        self.index_of.insert(entity, idx);
        self.dag.add_node(idx);
        idx
    }

    /// Record a parent -> child dependency edge.
    ///
    /// # Errors
    /// Propagates the DAG's self-loop/cycle rejection. The typed three-tier
    /// hierarchy cannot produce either, so a failure here means the plan
    /// builder itself is broken.
    pub fn link(&mut self, parent: &EntityRef, child: &EntityRef) -> Result<(), DagError> {
        let from = self.intern(parent.clone());
        let to = self.intern(child.clone());
        self.dag.add_edge(from, to)
    }

    /// Record a skipped reference.
    pub fn skip(&mut self, parent: EntityRef, child: EntityRef, reason: SkipReason) {
        tracing::warn!(parent = %parent, child = %child, %reason, "skipping reference");
        self.skipped.push(SkippedRef {
            parent,
            child,
            reason,
        });
    }

    /// Bottom-up schedule over every interned entity: each child strictly
    /// before every one of its parents (projects, then companies, then
    /// funds, with shared nodes appearing once).
    #[must_use]
    pub fn bottom_up(&self) -> Vec<EntityRef> {
        self.dag
            .bottom_up_order()
            .into_iter()
            .map(|idx| self.entity_of[idx as usize].clone())
            .collect()
    }

    /// Every entity in one fund's resolved subtree (the write set of a
    /// scoped run).
    #[must_use]
    pub fn subtree_of(&self, fund_id: &FundId) -> Vec<EntityRef> {
        let mut members = Vec::new();
        let Some(fund_node) = self.funds.get(fund_id) else {
            return members;
        };
        members.push(EntityRef::fund(fund_id));
        for holding in &fund_node.children {
            members.push(EntityRef::company(&holding.target));
            if let Some(company_node) = self.companies.get(&holding.target) {
                for project in &company_node.children {
                    let entity = EntityRef::project(&project.target);
                    if !members.contains(&entity) {
                        members.push(entity);
                    }
                }
            }
        }
        members
    }

    /// Total resolved entities across all three tiers.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.funds.len() + self.companies.len() + self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookthrough_model::EntityKind;

    #[test]
    fn intern_is_idempotent() {
        let mut plan = PropagationPlan::new();
        let a = plan.intern(EntityRef::fund(&FundId::new("f-1")));
        let b = plan.intern(EntityRef::fund(&FundId::new("f-1")));
        assert_eq!(a, b);
        let c = plan.intern(EntityRef::company(&CompanyId::new("f-1")));
        // Same id, different tier: a distinct node.
        assert_ne!(a, c);
    }

    #[test]
    fn bottom_up_respects_links() {
        let mut plan = PropagationPlan::new();
        let fund = EntityRef::fund(&FundId::new("f"));
        let company = EntityRef::company(&CompanyId::new("c"));
        let project = EntityRef::project(&ProjectId::new("p"));

        plan.link(&fund, &company).unwrap();
        plan.link(&company, &project).unwrap();

        let order = plan.bottom_up();
        let pos = |e: &EntityRef| order.iter().position(|x| x == e).unwrap();
        assert!(pos(&project) < pos(&company));
        assert!(pos(&company) < pos(&fund));
    }

    #[test]
    fn skip_records_accumulate() {
        let mut plan = PropagationPlan::new();
        plan.skip(
            EntityRef::company(&CompanyId::new("c")),
            EntityRef::project(&ProjectId::new("ghost")),
            SkipReason::MissingEntity,
        );
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].child.kind, EntityKind::Project);
    }
}
