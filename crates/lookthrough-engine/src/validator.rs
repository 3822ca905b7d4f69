//! Post-pass consistency audit.
//!
//! The validator annotates a run, it never gates one: every check emits
//! findings onto the run report and the run completes regardless.

use lookthrough_model::{
    EntityRef, MetricKey, MetricKind, MetricSnapshot, MetricValue, WEIGHT_SUM_TOLERANCE,
};
use lookthrough_resolver::PropagationPlan;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Classification of a data-quality finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Declared child weights exceed 1.0 beyond the tolerance band.
    WeightSumOutOfTolerance,
    /// A declared holding carries a zero or negative weight and therefore
    /// contributes nothing to aggregation.
    NonPositiveWeight,
    /// A metric value sits outside its declared valid range.
    MetricOutOfRange,
    /// A resolved child carries no value for an additive metric its siblings
    /// report, so it contributed zero to the parent's weighted sum.
    MissingAdditiveMetric,
    /// A parent with data-bearing children aggregated to nothing but
    /// undetermined values - an aggregation bug, not a data gap.
    AllUndetermined,
}

/// One audit finding, attached to the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub entity: EntityRef,
    pub kind: FindingKind,
    pub detail: String,
}

/// Post-pass audit over the resolved plan and the snapshots staged this run.
#[derive(Debug, Default)]
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    /// Run every check and collect findings. Never fails.
    #[must_use]
    pub fn audit(
        plan: &PropagationPlan,
        staged: &HashMap<EntityRef, MetricSnapshot>,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        Self::check_weights(plan, &mut findings);
        Self::check_ranges(plan, staged, &mut findings);
        Self::check_additive_gaps(plan, staged, &mut findings);
        Self::check_undetermined(plan, staged, &mut findings);
        if !findings.is_empty() {
            tracing::warn!(count = findings.len(), "consistency findings");
        }
        findings
    }

    /// (a) Declared weight sums within tolerance, no zero/negative weights.
    fn check_weights(plan: &PropagationPlan, findings: &mut Vec<Finding>) {
        for (id, node) in &plan.funds {
            let entity = EntityRef::fund(id);
            let sum = node.fund.declared_weight_sum();
            if sum > 1.0 + WEIGHT_SUM_TOLERANCE {
                findings.push(Finding {
                    entity: entity.clone(),
                    kind: FindingKind::WeightSumOutOfTolerance,
                    detail: format!("declared company weights sum to {sum:.4}"),
                });
            }
            for holding in &node.fund.holdings {
                if holding.weight <= 0.0 {
                    findings.push(Finding {
                        entity: entity.clone(),
                        kind: FindingKind::NonPositiveWeight,
                        detail: format!(
                            "holding {} has weight {}",
                            holding.target, holding.weight
                        ),
                    });
                }
            }
        }

        for (id, node) in &plan.companies {
            let entity = EntityRef::company(id);
            let sum = node.company.declared_weight_sum();
            if sum > 1.0 + WEIGHT_SUM_TOLERANCE {
                findings.push(Finding {
                    entity: entity.clone(),
                    kind: FindingKind::WeightSumOutOfTolerance,
                    detail: format!("declared project weights sum to {sum:.4}"),
                });
            }
            for holding in &node.company.holdings {
                if holding.weight <= 0.0 {
                    findings.push(Finding {
                        entity: entity.clone(),
                        kind: FindingKind::NonPositiveWeight,
                        detail: format!(
                            "holding {} has weight {}",
                            holding.target, holding.weight
                        ),
                    });
                }
            }
        }
    }

    /// (b) No metric outside its declared valid range, authored leaves
    /// included.
    fn check_ranges(
        plan: &PropagationPlan,
        staged: &HashMap<EntityRef, MetricSnapshot>,
        findings: &mut Vec<Finding>,
    ) {
        let leaf_snapshots = plan
            .projects
            .iter()
            .map(|(id, p)| (EntityRef::project(id), &p.sustainability_metrics));
        let staged_snapshots = staged.iter().map(|(e, s)| (e.clone(), s));

        for (entity, snapshot) in leaf_snapshots.chain(staged_snapshots) {
            for (key, value) in &snapshot.metrics {
                let (Some(range), MetricValue::Value(v)) = (key.valid_range(), value) else {
                    continue;
                };
                if !range.contains(v) {
                    findings.push(Finding {
                        entity: entity.clone(),
                        kind: FindingKind::MetricOutOfRange,
                        detail: format!("{key} = {v} outside [{}, {}]", range.start(), range.end()),
                    });
                }
            }
        }
    }

    /// (c) Additive metrics where a resolved child reported no value and
    /// therefore contributed zero to the parent's sum. The sum does not
    /// guess; the gap is surfaced here instead of being silently accepted.
    fn check_additive_gaps(
        plan: &PropagationPlan,
        staged: &HashMap<EntityRef, MetricSnapshot>,
        findings: &mut Vec<Finding>,
    ) {
        for (id, node) in &plan.companies {
            let children: Vec<(EntityRef, &MetricSnapshot)> = node
                .children
                .iter()
                .filter_map(|h| {
                    plan.projects
                        .get(&h.target)
                        .map(|p| (EntityRef::project(&h.target), &p.sustainability_metrics))
                })
                .collect();
            Self::flag_additive_gaps(&EntityRef::company(id), &children, findings);
        }

        for (id, node) in &plan.funds {
            let children: Vec<(EntityRef, &MetricSnapshot)> = node
                .children
                .iter()
                .filter_map(|h| {
                    let child = EntityRef::company(&h.target);
                    staged.get(&child).map(|s| (child, s))
                })
                .collect();
            Self::flag_additive_gaps(&EntityRef::fund(id), &children, findings);
        }
    }

    /// One finding per parent and additive key that at least one sibling
    /// reports and at least one resolved child lacks.
    fn flag_additive_gaps(
        parent: &EntityRef,
        children: &[(EntityRef, &MetricSnapshot)],
        findings: &mut Vec<Finding>,
    ) {
        let mut additive_keys: BTreeSet<&MetricKey> = BTreeSet::new();
        for (_, snapshot) in children {
            for key in snapshot.metrics.keys() {
                if key.kind() == MetricKind::WeightedSum && snapshot.value(key).is_some() {
                    additive_keys.insert(key);
                }
            }
        }

        for key in additive_keys {
            let missing: Vec<&str> = children
                .iter()
                .filter(|(_, snapshot)| snapshot.value(key).is_none())
                .map(|(child, _)| child.id.as_str())
                .collect();
            if !missing.is_empty() {
                findings.push(Finding {
                    entity: parent.clone(),
                    kind: FindingKind::MissingAdditiveMetric,
                    detail: format!("{key} contributed zero for {}", missing.join(", ")),
                });
            }
        }
    }

    /// (d) No parent left all-undetermined when its children carry data.
    fn check_undetermined(
        plan: &PropagationPlan,
        staged: &HashMap<EntityRef, MetricSnapshot>,
        findings: &mut Vec<Finding>,
    ) {
        for (id, node) in &plan.companies {
            let entity = EntityRef::company(id);
            let children_have_data = node.children.iter().any(|h| {
                plan.projects
                    .get(&h.target)
                    .is_some_and(|p| p.sustainability_metrics.has_data())
            });
            if children_have_data
                && staged.get(&entity).is_some_and(MetricSnapshot::all_undetermined)
            {
                findings.push(Finding {
                    entity,
                    kind: FindingKind::AllUndetermined,
                    detail: "children carry data but aggregate is entirely undetermined"
                        .to_string(),
                });
            }
        }

        for (id, node) in &plan.funds {
            let entity = EntityRef::fund(id);
            let children_have_data = node.children.iter().any(|h| {
                staged
                    .get(&EntityRef::company(&h.target))
                    .is_some_and(MetricSnapshot::has_data)
            });
            if children_have_data
                && staged.get(&entity).is_some_and(MetricSnapshot::all_undetermined)
            {
                findings.push(Finding {
                    entity,
                    kind: FindingKind::AllUndetermined,
                    detail: "children carry data but aggregate is entirely undetermined"
                        .to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookthrough_model::{CompanyId, FundId, MetricKey, Scope};
    use lookthrough_resolver::HierarchyResolver;
    use lookthrough_test_utils::{company, fund, project, StoreBuilder};
    use std::sync::Arc;

    async fn plan_for(store: lookthrough_store::MemoryStore) -> PropagationPlan {
        HierarchyResolver::new(Arc::new(store))
            .resolve(&Scope::All)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn overweight_parent_is_flagged() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[("p1", 0.75), ("p2", 0.40)]))
            .project(project("p1", &[(MetricKey::ENVIRONMENTAL_SCORE, 50.0)]))
            .project(project("p2", &[(MetricKey::ENVIRONMENTAL_SCORE, 70.0)]))
            .build();
        let plan = plan_for(store).await;

        let findings = ConsistencyValidator::audit(&plan, &HashMap::new());
        assert!(findings.iter().any(|f| {
            f.kind == FindingKind::WeightSumOutOfTolerance && f.entity.id == "c"
        }));
    }

    #[tokio::test]
    async fn weight_sum_within_tolerance_is_clean() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[("p1", 0.6), ("p2", 0.405)]))
            .project(project("p1", &[(MetricKey::ENVIRONMENTAL_SCORE, 50.0)]))
            .project(project("p2", &[(MetricKey::ENVIRONMENTAL_SCORE, 70.0)]))
            .build();
        let plan = plan_for(store).await;

        let findings = ConsistencyValidator::audit(&plan, &HashMap::new());
        assert!(!findings
            .iter()
            .any(|f| f.kind == FindingKind::WeightSumOutOfTolerance));
    }

    #[tokio::test]
    async fn zero_weight_holding_is_flagged() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 0.0)]))
            .company(company("c", &[]))
            .build();
        let plan = plan_for(store).await;

        let findings = ConsistencyValidator::audit(&plan, &HashMap::new());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::NonPositiveWeight && f.entity.id == "f"));
    }

    #[tokio::test]
    async fn out_of_range_leaf_metric_is_flagged() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[("p", 1.0)]))
            .project(project("p", &[(MetricKey::GOVERNANCE_SCORE, 140.0)]))
            .build();
        let plan = plan_for(store).await;

        let findings = ConsistencyValidator::audit(&plan, &HashMap::new());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::MetricOutOfRange && f.entity.id == "p"));
    }

    #[tokio::test]
    async fn additive_gap_child_is_flagged() {
        // p2 has no carbon figure: it contributed zero to c's weighted sum.
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[("p1", 0.6), ("p2", 0.4)]))
            .project(project("p1", &[(MetricKey::CARBON_IMPACT_TCO2E, 100.0)]))
            .project(project("p2", &[(MetricKey::SOCIAL_SCORE, 50.0)]))
            .build();
        let plan = plan_for(store).await;

        let findings = ConsistencyValidator::audit(&plan, &HashMap::new());
        let gap = findings
            .iter()
            .find(|f| f.kind == FindingKind::MissingAdditiveMetric)
            .unwrap();
        assert_eq!(gap.entity.id, "c");
        assert!(gap.detail.contains("carbon_impact_tco2e"));
        assert!(gap.detail.contains("p2"));
    }

    #[tokio::test]
    async fn uniform_additive_coverage_is_clean() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[("p1", 0.6), ("p2", 0.4)]))
            .project(project("p1", &[(MetricKey::WATER_USAGE_M3, 100.0)]))
            .project(project("p2", &[(MetricKey::WATER_USAGE_M3, 40.0)]))
            .build();
        let plan = plan_for(store).await;

        let findings = ConsistencyValidator::audit(&plan, &HashMap::new());
        assert!(!findings
            .iter()
            .any(|f| f.kind == FindingKind::MissingAdditiveMetric));
    }

    #[tokio::test]
    async fn additive_gap_between_companies_is_flagged_on_the_fund() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c1", 0.5), ("c2", 0.5)]))
            .company(company("c1", &[]))
            .company(company("c2", &[]))
            .build();
        let plan = plan_for(store).await;

        // Staged company results from this run: only c1 reports emissions.
        let mut staged = HashMap::new();
        staged.insert(
            EntityRef::company(&CompanyId::new("c1")),
            MetricSnapshot::new().with(MetricKey::CARBON_IMPACT_TCO2E, 120.0),
        );
        staged.insert(
            EntityRef::company(&CompanyId::new("c2")),
            MetricSnapshot::new().with(MetricKey::SOCIAL_SCORE, 55.0),
        );

        let findings = ConsistencyValidator::audit(&plan, &staged);
        let gap = findings
            .iter()
            .find(|f| f.kind == FindingKind::MissingAdditiveMetric)
            .unwrap();
        assert_eq!(gap.entity.id, "f");
        assert!(gap.detail.contains("c2"));
    }

    #[tokio::test]
    async fn all_undetermined_parent_with_data_children_is_flagged() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[("p", 1.0)]))
            .project(project("p", &[(MetricKey::SOCIAL_SCORE, 66.0)]))
            .build();
        let plan = plan_for(store).await;

        // Simulate a broken aggregation that staged only sentinels.
        let mut staged = HashMap::new();
        let mut broken = MetricSnapshot::new();
        broken.set(
            MetricKey::from(MetricKey::SOCIAL_SCORE),
            MetricValue::Undetermined,
        );
        staged.insert(EntityRef::company(&CompanyId::new("c")), broken);

        let findings = ConsistencyValidator::audit(&plan, &staged);
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::AllUndetermined && f.entity.id == "c"));
    }

    #[tokio::test]
    async fn childless_parent_is_not_flagged_undetermined() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[]))
            .build();
        let plan = plan_for(store).await;

        let mut staged = HashMap::new();
        staged.insert(
            EntityRef::company(&CompanyId::new("c")),
            MetricSnapshot::new(),
        );
        staged.insert(EntityRef::fund(&FundId::new("f")), MetricSnapshot::new());

        let findings = ConsistencyValidator::audit(&plan, &staged);
        assert!(!findings
            .iter()
            .any(|f| f.kind == FindingKind::AllUndetermined));
    }

    #[tokio::test]
    async fn validator_ignores_missing_project_entries() {
        let store = StoreBuilder::new()
            .fund(fund("f", 100.0, &[("c", 1.0)]))
            .company(company("c", &[("ghost", 1.0)]))
            .build();
        let plan = plan_for(store).await;

        let findings = ConsistencyValidator::audit(&plan, &HashMap::new());
        assert!(!findings
            .iter()
            .any(|f| f.kind == FindingKind::AllUndetermined));
    }
}
