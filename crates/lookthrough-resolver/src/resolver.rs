//! Scope resolution against the entity store.

use crate::error::ResolutionError;
use crate::plan::{CompanyNode, FundNode, PropagationPlan, SkipReason};
use lookthrough_model::{Company, EntityRef, Fund, Holding, Scope};
use lookthrough_store::{EntityStore, StoreError};
use std::sync::Arc;

/// Builds the in-memory traversal structure for one run scope.
#[derive(Debug)]
pub struct HierarchyResolver<S> {
    store: Arc<S>,
}

impl<S: EntityStore> HierarchyResolver<S> {
    #[inline]
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Materialize the propagation plan for `scope`.
    ///
    /// Missing or mistyped references become skip records on the plan;
    /// shared companies and projects are fetched once and reused by
    /// reference.
    ///
    /// # Errors
    /// - `ResolutionError::StoreUnavailable` when the store cannot be
    ///   reached.
    /// - `ResolutionError::FundNotFound` when the scope names a nonexistent
    ///   fund.
    pub async fn resolve(&self, scope: &Scope) -> Result<PropagationPlan, ResolutionError> {
        let fund_ids = match scope {
            Scope::All => self.store.list_funds().await.map_err(|err| match err {
                StoreError::Unavailable(reason) => ResolutionError::StoreUnavailable(reason),
                other => ResolutionError::ListFailed(other.to_string()),
            })?,
            Scope::Fund(id) => vec![id.clone()],
        };
        tracing::info!(funds = fund_ids.len(), "resolving hierarchy");

        let mut plan = PropagationPlan::new();
        for fund_id in fund_ids {
            match self.store.get_fund(&fund_id).await {
                Ok(fund) => self.resolve_fund(&mut plan, fund).await?,
                Err(StoreError::Unavailable(reason)) => {
                    return Err(ResolutionError::StoreUnavailable(reason));
                }
                Err(err) => {
                    if matches!(scope, Scope::Fund(_)) {
                        return Err(ResolutionError::from_fund_fetch(err, &fund_id));
                    }
                    // Listed a moment ago but gone now; skip it like any
                    // other dangling reference.
                    let entity = EntityRef::fund(&fund_id);
                    plan.skip(entity.clone(), entity, SkipReason::MissingEntity);
                }
            }
        }
        Ok(plan)
    }

    async fn resolve_fund(
        &self,
        plan: &mut PropagationPlan,
        fund: Fund,
    ) -> Result<(), ResolutionError> {
        let fund_ref = EntityRef::fund(&fund.id);
        plan.intern(fund_ref.clone());

        let mut children = Vec::with_capacity(fund.holdings.len());
        for holding in &fund.holdings {
            let company_ref = EntityRef::company(&holding.target);

            if !plan.companies.contains_key(&holding.target) {
                match self.store.get_company(&holding.target).await {
                    Ok(company) => self.resolve_company(plan, company).await?,
                    Err(StoreError::Unavailable(reason)) => {
                        return Err(ResolutionError::StoreUnavailable(reason));
                    }
                    Err(StoreError::KindMismatch { .. }) => {
                        plan.skip(fund_ref.clone(), company_ref, SkipReason::KindMismatch);
                        continue;
                    }
                    Err(_) => {
                        plan.skip(fund_ref.clone(), company_ref, SkipReason::MissingEntity);
                        continue;
                    }
                }
            }

            if plan.link(&fund_ref, &company_ref).is_err() {
                plan.skip(fund_ref.clone(), company_ref, SkipReason::CycleDetected);
                continue;
            }
            children.push(holding.clone());
        }

        plan.funds
            .insert(fund.id.clone(), FundNode { fund, children });
        Ok(())
    }

    async fn resolve_company(
        &self,
        plan: &mut PropagationPlan,
        company: Company,
    ) -> Result<(), ResolutionError> {
        let company_ref = EntityRef::company(&company.id);
        plan.intern(company_ref.clone());

        let mut children: Vec<Holding<_>> = Vec::with_capacity(company.holdings.len());
        for holding in &company.holdings {
            let project_ref = EntityRef::project(&holding.target);

            if !plan.projects.contains_key(&holding.target) {
                match self.store.get_project(&holding.target).await {
                    Ok(project) => {
                        plan.intern(project_ref.clone());
                        plan.projects.insert(holding.target.clone(), project);
                    }
                    Err(StoreError::Unavailable(reason)) => {
                        return Err(ResolutionError::StoreUnavailable(reason));
                    }
                    Err(StoreError::KindMismatch { .. }) => {
                        plan.skip(company_ref.clone(), project_ref, SkipReason::KindMismatch);
                        continue;
                    }
                    Err(_) => {
                        plan.skip(company_ref.clone(), project_ref, SkipReason::MissingEntity);
                        continue;
                    }
                }
            }

            if plan.link(&company_ref, &project_ref).is_err() {
                plan.skip(company_ref.clone(), project_ref, SkipReason::CycleDetected);
                continue;
            }
            children.push(holding.clone());
        }

        plan.companies
            .insert(company.id.clone(), CompanyNode { company, children });
        Ok(())
    }
}

/// Scope helper used by callers that report on what a run covered.
#[must_use]
pub fn scope_label(scope: &Scope) -> String {
    match scope {
        Scope::All => "all funds".to_string(),
        Scope::Fund(id) => format!("fund {id}"),
    }
}
