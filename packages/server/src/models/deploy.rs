use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

use super::shared::{validate_text, validate_token_amount};

/// Deploy a paid project from the platform wallet.
#[derive(Deserialize, ToSchema)]
pub struct DeployRequest {
    #[schema(example = 12)]
    pub project_id: i32,
    /// Receives the initial supply and contract ownership.
    #[schema(example = "0x000000000000000000000000000000000000dEaD")]
    pub owner_address: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeployResponse {
    pub project_id: i32,
    pub chain_id: u64,
    /// Address the contract will have once the transaction is mined.
    pub contract_address: String,
    /// Pending transaction hash.
    pub tx_hash: String,
    pub explorer_tx_url: Option<String>,
    /// `false` when the transaction was sent but the project row could not
    /// be updated.
    pub persisted: bool,
    pub submitted_at: DateTime<Utc>,
}

/// Record a deployment made outside the platform wallet (e.g. from the
/// user's own wallet).
#[derive(Deserialize, ToSchema)]
pub struct RecordDeploymentRequest {
    /// Existing project to attach the deployment to. When absent, the token
    /// metadata fields are required and a new project is created.
    pub project_id: Option<i32>,
    #[schema(example = 137)]
    pub chain_id: u64,
    pub contract_address: String,
    pub tx_hash: String,
    pub owner_address: String,
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub initial_supply: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

fn is_hex_of_len(value: &str, len: usize) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == len && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub fn validate_record_request(req: &RecordDeploymentRequest) -> Result<(), AppError> {
    if common::chain::find(req.chain_id).is_none() {
        return Err(AppError::Validation(format!(
            "Chain {} is not supported",
            req.chain_id
        )));
    }
    if !is_hex_of_len(&req.tx_hash, 64) {
        return Err(AppError::Validation(
            "tx_hash must be a 0x-prefixed 32-byte hex string".into(),
        ));
    }
    if req.project_id.is_none() {
        validate_text(req.name.as_deref().unwrap_or_default(), "Name", 64)?;
        validate_text(req.ticker.as_deref().unwrap_or_default(), "Ticker", 10)?;
        validate_token_amount(
            req.initial_supply.as_deref().unwrap_or_default(),
            "Initial supply",
        )?;
    }
    Ok(())
}
