pub mod chain;
pub mod plan;
pub mod subscription_status;

pub use chain::ChainInfo;
pub use plan::{LimitDecision, Plan, PlanLimits};
pub use subscription_status::SubscriptionStatus;
