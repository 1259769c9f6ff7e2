use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chain id of Polygon PoS mainnet, which carries its own per-chain quota.
pub const POLYGON_MAINNET: u64 = 137;

/// Limit value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// Subscription tier controlling deployment quotas.
///
/// Stored as its lowercase key in `profile.plan_activo`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Basic,
    Pro,
    Enterprise,
}

/// Deployment quotas of a plan. `-1` means unlimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct PlanLimits {
    /// Maximum deployments across all chains.
    pub total: i64,
    /// Maximum deployments on Polygon mainnet.
    pub polygon: i64,
    /// Maximum deployments on any other single chain.
    pub other_chain: i64,
}

impl PlanLimits {
    /// Per-chain limit that applies to `chain_id`.
    pub fn for_chain(&self, chain_id: u64) -> i64 {
        if chain_id == POLYGON_MAINNET {
            self.polygon
        } else {
            self.other_chain
        }
    }
}

/// Outcome of a quota check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed,
    /// The plan-wide deployment limit is used up.
    TotalExceeded { limit: i64 },
    /// The limit for the requested chain is used up.
    ChainExceeded { chain_id: u64, limit: i64 },
}

impl LimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

fn within(count: u64, limit: i64) -> bool {
    limit == UNLIMITED || (limit >= 0 && count < limit as u64)
}

impl Plan {
    pub const ALL: &'static [Plan] = &[Self::Free, Self::Basic, Self::Pro, Self::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    pub fn limits(&self) -> PlanLimits {
        match self {
            Self::Free => PlanLimits {
                total: 1,
                polygon: 1,
                other_chain: 1,
            },
            Self::Basic => PlanLimits {
                total: 5,
                polygon: 3,
                other_chain: 2,
            },
            Self::Pro => PlanLimits {
                total: 20,
                polygon: 10,
                other_chain: 5,
            },
            Self::Enterprise => PlanLimits {
                total: UNLIMITED,
                polygon: UNLIMITED,
                other_chain: UNLIMITED,
            },
        }
    }

    /// Decide whether one more deployment on `chain_id` is allowed, given the
    /// user's existing deployment counts. Both limits must pass; the total
    /// limit is reported first.
    pub fn check_deployment(&self, chain_id: u64, total: u64, on_chain: u64) -> LimitDecision {
        let limits = self.limits();
        if !within(total, limits.total) {
            return LimitDecision::TotalExceeded {
                limit: limits.total,
            };
        }
        let chain_limit = limits.for_chain(chain_id);
        if !within(on_chain, chain_limit) {
            return LimitDecision::ChainExceeded {
                chain_id,
                limit: chain_limit,
            };
        }
        LimitDecision::Allowed
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown plan key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown plan '{0}'")]
pub struct ParsePlanError(pub String);

impl FromStr for Plan {
    type Err = ParsePlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(ParsePlanError(s.to_string())),
        }
    }
}
