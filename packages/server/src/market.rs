//! Market data from the DexScreener public API.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::MarketConfig;
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
struct TokenPairs {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub pair_address: String,
    pub price_usd: Option<String>,
    pub liquidity: Option<Liquidity>,
    pub volume: Option<Volume>,
    pub fdv: Option<f64>,
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Volume {
    pub h24: Option<f64>,
}

impl Pair {
    fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }
}

/// Cached market figures for a token.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarketSnapshot {
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub price_usd: Option<f64>,
}

impl MarketSnapshot {
    pub fn from_pair(pair: &Pair) -> Self {
        Self {
            market_cap: pair.market_cap.or(pair.fdv),
            volume_24h: pair.volume.as_ref().and_then(|v| v.h24),
            liquidity_usd: pair.liquidity.as_ref().and_then(|l| l.usd),
            price_usd: pair.price_usd.as_deref().and_then(|p| p.parse().ok()),
        }
    }
}

/// Pair with the deepest USD liquidity, restricted to `chain_slug` when given.
pub fn deepest_pair<'p>(pairs: &'p [Pair], chain_slug: Option<&str>) -> Option<&'p Pair> {
    pairs
        .iter()
        .filter(|p| chain_slug.is_none_or(|slug| p.chain_id == slug))
        .max_by(|a, b| a.liquidity_usd().total_cmp(&b.liquidity_usd()))
}

/// Whether data stamped `updated_at` is recent enough to skip a refetch.
pub fn is_fresh(
    updated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_refresh_secs: i64,
) -> bool {
    updated_at.is_some_and(|t| now - t < Duration::seconds(min_refresh_secs))
}

pub struct MarketClient<'a> {
    http: &'a reqwest::Client,
    config: &'a MarketConfig,
}

impl<'a> MarketClient<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a MarketConfig) -> Self {
        Self { http, config }
    }

    /// Fetch the current snapshot of `token`, or `None` when it has no pairs.
    #[instrument(skip(self))]
    pub async fn snapshot(
        &self,
        token: &str,
        chain_slug: Option<&str>,
    ) -> Result<Option<MarketSnapshot>, AppError> {
        let url = format!(
            "{}/latest/dex/tokens/{token}",
            self.config.api_base.trim_end_matches('/')
        );
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("DexScreener returned {status}")));
        }

        let body: TokenPairs = res.json().await?;
        let pairs = body.pairs.unwrap_or_default();
        let Some(pair) = deepest_pair(&pairs, chain_slug) else {
            debug!(count = pairs.len(), "No matching pairs");
            return Ok(None);
        };
        debug!(pair = %pair.pair_address, liquidity = pair.liquidity_usd(), "Selected pair");
        Ok(Some(MarketSnapshot::from_pair(pair)))
    }
}
