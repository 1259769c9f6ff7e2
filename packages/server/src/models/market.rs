use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::project;

#[derive(Serialize, ToSchema)]
pub struct MarketResponse {
    pub project_id: i32,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub price_usd: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
    /// `true` when the stored figures were returned without calling the
    /// market-data API.
    pub cached: bool,
}

impl MarketResponse {
    pub fn from_model(m: &project::Model, cached: bool) -> Self {
        Self {
            project_id: m.id,
            market_cap: m.market_cap,
            volume_24h: m.volume_24h,
            liquidity_usd: m.liquidity_usd,
            price_usd: m.price_usd,
            updated_at: m.market_updated_at,
            cached,
        }
    }
}
