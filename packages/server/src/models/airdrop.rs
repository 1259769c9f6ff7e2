use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chain::airdrop::MAX_RECIPIENTS;
use crate::error::AppError;

use super::shared::validate_token_amount;

#[derive(Deserialize, ToSchema)]
pub struct AirdropRecipient {
    #[schema(example = "0x000000000000000000000000000000000000dEaD")]
    pub address: String,
    /// Whole tokens, decimal string.
    #[schema(example = "250.5")]
    pub amount: String,
}

/// Distribute tokens of a deployed project from its owner's wallet.
///
/// The owner must first `approve` the platform wallet for at least the total.
#[derive(Deserialize, ToSchema)]
pub struct AirdropRequest {
    pub project_id: i32,
    pub recipients: Vec<AirdropRecipient>,
}

#[derive(Serialize, ToSchema)]
pub struct AirdropTransfer {
    pub address: String,
    pub amount: String,
    pub tx_hash: String,
}

#[derive(Serialize, ToSchema)]
pub struct AirdropResponse {
    /// Platform wallet that sent the transfers.
    pub operator: String,
    pub transfers: Vec<AirdropTransfer>,
    /// `false` when the batch stopped early; the remaining recipients were
    /// not sent anything.
    pub complete: bool,
}

pub fn validate_airdrop_request(req: &AirdropRequest) -> Result<(), AppError> {
    if req.recipients.is_empty() {
        return Err(AppError::Validation("Recipients must not be empty".into()));
    }
    if req.recipients.len() > MAX_RECIPIENTS {
        return Err(AppError::Validation(format!(
            "Too many recipients: max {MAX_RECIPIENTS}"
        )));
    }
    let mut seen = HashSet::new();
    for r in &req.recipients {
        validate_token_amount(&r.amount, "Amount")?;
        if !seen.insert(r.address.trim().to_ascii_lowercase()) {
            return Err(AppError::Validation(format!(
                "Duplicate recipient: {}",
                r.address
            )));
        }
    }
    Ok(())
}
