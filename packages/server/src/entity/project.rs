use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub profile: HasOne<super::profile::Entity>,

    pub name: String,
    pub ticker: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub chain_id: i64,
    /// Whole tokens, as a decimal string (18 decimals are applied on deploy).
    pub initial_supply: String,

    /// NULL until deployed.
    pub owner_address: Option<String>,
    /// NULL until deployed.
    pub contract_address: Option<String>,
    pub tx_hash: Option<String>,
    pub deployed_at: Option<DateTimeUtc>,

    pub is_paid: bool,
    pub is_renounced: bool,
    pub is_locked: bool,

    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,

    // Market data cache, refreshed on demand.
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub price_usd: Option<f64>,
    pub market_updated_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub locked_contents: HasMany<super::locked_content::Entity>,

    #[sea_orm(has_many)]
    pub favorites: HasMany<super::favorite::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn is_deployed(&self) -> bool {
        self.contract_address.is_some()
    }
}

impl ActiveModelBehavior for ActiveModel {}
