use chrono::{DateTime, Utc};
use common::{Plan, PlanLimits, SubscriptionStatus};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::profile;
use crate::quota::DeploymentUsage;

/// Deployments on one chain against the plan's limit for it.
#[derive(Serialize, ToSchema)]
pub struct ChainUsage {
    #[schema(example = 137)]
    pub chain_id: u64,
    #[schema(example = "Polygon")]
    pub chain_name: String,
    pub deployed: u64,
    /// `-1` means unlimited.
    pub limit: i64,
}

#[derive(Serialize, ToSchema)]
pub struct UsageResponse {
    pub total: u64,
    pub chains: Vec<ChainUsage>,
}

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub plan: Plan,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_period_end: Option<DateTime<Utc>>,
    /// Whether a Stripe customer exists, i.e. the billing portal is available.
    pub has_billing_account: bool,
    pub limits: PlanLimits,
    pub usage: UsageResponse,
    pub created_at: DateTime<Utc>,
}

impl ProfileResponse {
    pub fn new(model: profile::Model, plan: Plan, usage: &DeploymentUsage) -> Self {
        let limits = plan.limits();
        let chains = common::chain::SUPPORTED_CHAINS
            .iter()
            .map(|chain| ChainUsage {
                chain_id: chain.id,
                chain_name: chain.name.to_string(),
                deployed: usage.on_chain(chain.id),
                limit: limits.for_chain(chain.id),
            })
            .collect();
        Self {
            id: model.id,
            email: model.email,
            plan,
            subscription_status: model.subscription_status,
            subscription_period_end: model.subscription_period_end,
            has_billing_account: model.stripe_customer_id.is_some(),
            limits,
            usage: UsageResponse {
                total: usage.total,
                chains,
            },
            created_at: model.created_at,
        }
    }
}
