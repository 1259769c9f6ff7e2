use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::project;
use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{
    double_option, validate_optional_text, validate_optional_url, validate_text,
    validate_token_amount,
};

/// Request body for creating a token project.
#[derive(Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// Token name (1-64 characters).
    #[schema(example = "Crafted Coin")]
    pub name: String,
    /// Token symbol (2-10 letters or digits, stored uppercase).
    #[schema(example = "CRAFT")]
    pub ticker: String,
    #[schema(example = "Community token for the Crafted DAO")]
    pub description: Option<String>,
    pub logo_url: Option<String>,
    /// Target chain id.
    #[schema(example = 137)]
    pub chain_id: u64,
    /// Whole tokens minted to the owner on deployment.
    #[schema(example = "1000000")]
    pub initial_supply: String,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
}

/// Partial update of a project. Absent fields are left unchanged; `null`
/// clears a nullable field.
#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub logo_url: Option<Option<String>>,
    pub chain_id: Option<u64>,
    pub initial_supply: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub twitter: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub telegram: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub discord: Option<Option<String>>,
    /// Liquidity has been locked (deployed projects only).
    pub is_locked: Option<bool>,
    /// Contract ownership has been renounced (deployed projects only).
    pub is_renounced: Option<bool>,
}

impl UpdateProjectRequest {
    /// Whether the request touches fields frozen once the token is on chain.
    pub fn touches_token_fields(&self) -> bool {
        self.name.is_some()
            || self.ticker.is_some()
            || self.chain_id.is_some()
            || self.initial_supply.is_some()
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProjectResponse {
    #[schema(example = 12)]
    pub id: i32,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub ticker: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub chain_id: i64,
    pub initial_supply: String,
    pub owner_address: Option<String>,
    pub contract_address: Option<String>,
    pub tx_hash: Option<String>,
    pub deployed_at: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub is_renounced: bool,
    pub is_locked: bool,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub price_usd: Option<f64>,
    pub market_updated_at: Option<DateTime<Utc>>,
    /// Explorer link for the contract, when deployed on a known chain.
    pub explorer_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<project::Model> for ProjectResponse {
    fn from(m: project::Model) -> Self {
        let explorer_url = m.contract_address.as_deref().and_then(|address| {
            common::chain::find(m.chain_id as u64).map(|chain| chain.address_url(address))
        });
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            ticker: m.ticker,
            description: m.description,
            logo_url: m.logo_url,
            chain_id: m.chain_id,
            initial_supply: m.initial_supply,
            owner_address: m.owner_address,
            contract_address: m.contract_address,
            tx_hash: m.tx_hash,
            deployed_at: m.deployed_at,
            is_paid: m.is_paid,
            is_renounced: m.is_renounced,
            is_locked: m.is_locked,
            website: m.website,
            twitter: m.twitter,
            telegram: m.telegram,
            discord: m.discord,
            market_cap: m.market_cap,
            volume_24h: m.volume_24h,
            liquidity_usd: m.liquidity_usd,
            price_usd: m.price_usd,
            market_updated_at: m.market_updated_at,
            explorer_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<ProjectResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 20, max 100).
    pub per_page: Option<u64>,
    /// Case-insensitive match on name or ticker.
    pub search: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExploreQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
    /// Only projects deployed on this chain.
    pub chain_id: Option<u64>,
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}

fn validate_ticker(ticker: &str) -> Result<(), AppError> {
    let ticker = ticker.trim();
    if !(2..=10).contains(&ticker.len()) || !ticker.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "Ticker must be 2-10 letters or digits".into(),
        ));
    }
    Ok(())
}

fn validate_chain(chain_id: u64) -> Result<(), AppError> {
    if common::chain::find(chain_id).is_none() {
        return Err(AppError::Validation(format!(
            "Chain {chain_id} is not supported"
        )));
    }
    Ok(())
}

fn flat(value: &Option<Option<String>>) -> Option<&str> {
    value.as_ref().and_then(|inner| inner.as_deref())
}

fn validate_links<'a>(
    links: impl IntoIterator<Item = (Option<&'a str>, &'a str)>,
) -> Result<(), AppError> {
    for (value, field) in links {
        validate_optional_url(value, field)?;
    }
    Ok(())
}

pub fn validate_create_project(req: &CreateProjectRequest) -> Result<(), AppError> {
    validate_text(&req.name, "Name", 64)?;
    validate_ticker(&req.ticker)?;
    validate_optional_text(req.description.as_deref(), "Description", 2000)?;
    validate_chain(req.chain_id)?;
    validate_token_amount(&req.initial_supply, "Initial supply")?;
    if req.initial_supply.contains('.') {
        return Err(AppError::Validation(
            "Initial supply must be a whole number of tokens".into(),
        ));
    }
    validate_links([
        (req.logo_url.as_deref(), "Logo URL"),
        (req.website.as_deref(), "Website"),
        (req.twitter.as_deref(), "Twitter"),
        (req.telegram.as_deref(), "Telegram"),
        (req.discord.as_deref(), "Discord"),
    ])
}

pub fn validate_update_project(req: &UpdateProjectRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_text(name, "Name", 64)?;
    }
    if let Some(ref ticker) = req.ticker {
        validate_ticker(ticker)?;
    }
    if let Some(Some(ref description)) = req.description {
        validate_optional_text(Some(description), "Description", 2000)?;
    }
    if let Some(chain_id) = req.chain_id {
        validate_chain(chain_id)?;
    }
    if let Some(ref supply) = req.initial_supply {
        validate_token_amount(supply, "Initial supply")?;
        if supply.contains('.') {
            return Err(AppError::Validation(
                "Initial supply must be a whole number of tokens".into(),
            ));
        }
    }
    validate_links([
        (flat(&req.logo_url), "Logo URL"),
        (flat(&req.website), "Website"),
        (flat(&req.twitter), "Twitter"),
        (flat(&req.telegram), "Telegram"),
        (flat(&req.discord), "Discord"),
    ])
}
