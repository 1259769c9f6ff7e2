use std::collections::BTreeMap;

use common::{LimitDecision, Plan};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{profile, project};
use crate::error::AppError;

/// Successful deployments of one user, in total and per chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentUsage {
    pub total: u64,
    pub by_chain: BTreeMap<u64, u64>,
}

impl DeploymentUsage {
    pub fn from_chain_ids(chain_ids: &[i64]) -> Self {
        let mut by_chain = BTreeMap::new();
        for &chain_id in chain_ids {
            *by_chain.entry(chain_id as u64).or_insert(0) += 1;
        }
        Self {
            total: chain_ids.len() as u64,
            by_chain,
        }
    }

    pub fn on_chain(&self, chain_id: u64) -> u64 {
        self.by_chain.get(&chain_id).copied().unwrap_or(0)
    }
}

/// Parse a stored plan key, falling back to `free` for anything unknown.
pub fn resolve_plan(raw: &str) -> Plan {
    raw.parse().unwrap_or_else(|_| {
        warn!(plan = raw, "Unknown stored plan, treating as free");
        Plan::Free
    })
}

/// Map a denied decision to the error returned to the caller.
pub fn limit_error(plan: Plan, decision: LimitDecision) -> Option<AppError> {
    match decision {
        LimitDecision::Allowed => None,
        LimitDecision::TotalExceeded { limit } => Some(AppError::PlanLimitReached(format!(
            "The {plan} plan allows {limit} deployment(s) in total"
        ))),
        LimitDecision::ChainExceeded { chain_id, limit } => {
            Some(AppError::PlanLimitReached(format!(
                "The {plan} plan allows {limit} deployment(s) on chain {chain_id}"
            )))
        }
    }
}

pub struct QuotaService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> QuotaService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Plan of a user; a user without a profile row is on the free plan.
    pub async fn plan_of(&self, user_id: Uuid) -> Result<Plan, DbErr> {
        let stored: Option<String> = profile::Entity::find_by_id(user_id)
            .select_only()
            .column(profile::Column::PlanActivo)
            .into_tuple()
            .one(self.conn)
            .await?;
        Ok(stored.as_deref().map(resolve_plan).unwrap_or_default())
    }

    /// Count projects of `user_id` that carry a contract address.
    pub async fn usage(&self, user_id: Uuid) -> Result<DeploymentUsage, DbErr> {
        let chain_ids: Vec<i64> = project::Entity::find()
            .select_only()
            .column(project::Column::ChainId)
            .filter(project::Column::UserId.eq(user_id))
            .filter(project::Column::ContractAddress.is_not_null())
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(DeploymentUsage::from_chain_ids(&chain_ids))
    }

    /// Decide whether `user_id` may deploy one more token on `chain_id`.
    ///
    /// Not atomic with the deployment that follows; two concurrent requests
    /// can both pass.
    pub async fn check(
        &self,
        user_id: Uuid,
        chain_id: u64,
    ) -> Result<(Plan, LimitDecision), DbErr> {
        let plan = self.plan_of(user_id).await?;
        let usage = self.usage(user_id).await?;
        let decision = plan.check_deployment(chain_id, usage.total, usage.on_chain(chain_id));
        if !decision.is_allowed() {
            info!(%user_id, chain_id, %plan, ?decision, "Deployment denied by plan limit");
        }
        Ok((plan, decision))
    }

    /// Like [`check`](Self::check), but as a handler-ready result.
    pub async fn ensure_can_deploy(&self, user_id: Uuid, chain_id: u64) -> Result<Plan, AppError> {
        let (plan, decision) = self.check(user_id, chain_id).await?;
        match limit_error(plan, decision) {
            Some(err) => Err(err),
            None => Ok(plan),
        }
    }
}
