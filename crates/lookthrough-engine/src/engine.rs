//! The propagation engine: one run, end to end.

use crate::error::EngineError;
use crate::report::{RunReport, WriteFailure};
use crate::run_state::{validate_transition, RunState, StateMachineError};
use crate::validator::ConsistencyValidator;
use chrono::Utc;
use dashmap::DashMap;
use lookthrough_aggregate::{aggregate_children, ChildMetrics};
use lookthrough_model::{
    CompanyId, EntityKind, EntityRef, FundId, MetricSnapshot, PassId, Scope,
};
use lookthrough_resolver::{scope_label, HierarchyResolver, PropagationPlan, ResolutionError};
use lookthrough_store::EntityStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Orchestrates look-through propagation runs against an entity store.
///
/// One engine serves many runs. Runs over the same fund serialize on
/// per-fund locks held across aggregation and persistence, so a reader
/// never observes a subtree mixing two passes; runs over disjoint funds
/// proceed concurrently.
pub struct PropagationEngine<S> {
    store: Arc<S>,
    resolver: HierarchyResolver<S>,
    fund_locks: DashMap<FundId, Arc<Mutex<()>>>,
}

impl<S: EntityStore> PropagationEngine<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            resolver: HierarchyResolver::new(Arc::clone(&store)),
            store,
            fund_locks: DashMap::new(),
        }
    }

    /// Execute one propagation run over `scope`.
    ///
    /// Missing references, rejected writes, and data-quality findings
    /// accumulate on the returned report; the run keeps going.
    ///
    /// # Errors
    /// - [`EngineError::StoreUnavailable`] when the store cannot be reached
    ///   at run start.
    /// - [`EngineError::Resolution`] when the scope names a nonexistent fund.
    pub async fn propagate(&self, scope: &Scope) -> Result<RunReport, EngineError> {
        let started = Instant::now();
        let run_id = PassId::new();
        let mut state = RunState::Pending;
        tracing::info!(run = %run_id, scope = %scope_label(scope), "propagation run starting");

        if let Err(err) = self.store.ping().await {
            advance(&mut state, RunState::Failed)?;
            return Err(EngineError::StoreUnavailable(err.to_string()));
        }

        advance(&mut state, RunState::Resolving)?;
        let plan = match self.resolver.resolve(scope).await {
            Ok(plan) => plan,
            Err(err) => {
                advance(&mut state, RunState::Failed)?;
                return Err(match err {
                    ResolutionError::StoreUnavailable(reason) => {
                        EngineError::StoreUnavailable(reason)
                    }
                    other => EngineError::Resolution(other),
                });
            }
        };

        // Lock every fund in the plan before touching its subtree. The plan's
        // fund arena is a BTreeMap, so acquisition order is sorted and two
        // overlapping runs cannot deadlock on each other.
        let mut guards = Vec::with_capacity(plan.funds.len());
        for fund_id in plan.funds.keys() {
            let lock = Arc::clone(&*self.fund_locks.entry(fund_id.clone()).or_default());
            guards.push(lock.lock_owned().await);
        }

        advance(&mut state, RunState::Aggregating)?;
        let computed_at = Utc::now();
        let order = plan.bottom_up();
        let staged = stage_snapshots(&plan, &order, run_id, computed_at);
        tracing::debug!(
            run = %run_id,
            entities = order.len(),
            staged = staged.len(),
            "aggregation staged"
        );

        advance(&mut state, RunState::Persisting)?;
        let failed_writes = self.persist(&staged).await;

        advance(&mut state, RunState::Validating)?;
        let flagged = ConsistencyValidator::audit(&plan, &staged);

        advance(&mut state, RunState::Completed)?;
        drop(guards);

        // Drop lock entries no run is holding, so the map tracks funds in
        // flight rather than every fund ever propagated. A concurrent holder
        // keeps its entry alive through the Arc count; `remove_if` checks and
        // removes under the shard lock.
        for fund_id in plan.funds.keys() {
            self.fund_locks
                .remove_if(fund_id, |_, lock| Arc::strong_count(lock) == 1);
        }

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = started.elapsed().as_millis() as u64;
        let report = RunReport {
            run_id,
            scope: scope_label(scope),
            state,
            processed: order.len(),
            skipped: plan.skipped,
            flagged,
            failed_writes,
            duration_ms,
        };
        tracing::info!(
            run = %run_id,
            processed = report.processed,
            failed_writes = report.failed_writes.len(),
            passed = report.passed(),
            "propagation run finished"
        );
        Ok(report)
    }

    /// Write every staged snapshot, one independent write per entity.
    /// Rejections become report entries; siblings still land.
    async fn persist(&self, staged: &HashMap<EntityRef, MetricSnapshot>) -> Vec<WriteFailure> {
        let writes = staged.iter().map(|(entity, snapshot)| {
            let store = Arc::clone(&self.store);
            let entity = entity.clone();
            let snapshot = snapshot.clone();
            async move {
                store
                    .save_snapshot(&entity, snapshot)
                    .await
                    .map_err(|err| WriteFailure {
                        entity,
                        reason: err.to_string(),
                    })
            }
        });

        let mut failures: Vec<WriteFailure> = futures::future::join_all(writes)
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();
        failures.sort_by(|a, b| a.entity.id.cmp(&b.entity.id));
        for failure in &failures {
            tracing::warn!(entity = %failure.entity, reason = %failure.reason, "write rejected");
        }
        failures
    }
}

/// Derive company then fund snapshots in dependency order, stamping each with
/// this run's pass id. Project snapshots are authored upstream and never
/// staged.
fn stage_snapshots(
    plan: &PropagationPlan,
    order: &[EntityRef],
    run_id: PassId,
    computed_at: chrono::DateTime<Utc>,
) -> HashMap<EntityRef, MetricSnapshot> {
    let mut staged: HashMap<EntityRef, MetricSnapshot> = HashMap::new();

    for entity in order {
        match entity.kind {
            EntityKind::Project => {}
            EntityKind::Company => {
                let Some(node) = plan.companies.get(&CompanyId::new(entity.id.clone())) else {
                    continue;
                };
                let children: Vec<ChildMetrics<'_>> = node
                    .children
                    .iter()
                    .filter_map(|h| {
                        plan.projects
                            .get(&h.target)
                            .map(|p| ChildMetrics::new(h.weight, &p.sustainability_metrics))
                    })
                    .collect();
                let snapshot = aggregate_children(&children, node.company.annual_revenue)
                    .stamped(run_id, computed_at);
                staged.insert(entity.clone(), snapshot);
            }
            EntityKind::Fund => {
                let Some(node) = plan.funds.get(&FundId::new(entity.id.clone())) else {
                    continue;
                };
                // Bottom-up order guarantees every resolved child company was
                // staged earlier in this same pass.
                let children: Vec<ChildMetrics<'_>> = node
                    .children
                    .iter()
                    .filter_map(|h| {
                        staged
                            .get(&EntityRef::company(&h.target))
                            .map(|s| ChildMetrics::new(h.weight, s))
                    })
                    .collect();
                let snapshot = aggregate_children(&children, Some(node.fund.total_aum))
                    .stamped(run_id, computed_at);
                staged.insert(entity.clone(), snapshot);
            }
        }
    }

    staged
}

fn advance(state: &mut RunState, to: RunState) -> Result<(), StateMachineError> {
    let from = *state;
    validate_transition(from, to)?;
    tracing::debug!(?from, ?to, "run state transition");
    *state = to;
    Ok(())
}
