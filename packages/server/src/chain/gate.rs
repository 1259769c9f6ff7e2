//! Token-gated access: prove wallet control, then check the holding.

use std::str::FromStr;

use alloy::primitives::{Address, Signature, U256};
use tracing::instrument;

use super::erc20::IERC20;
use super::{ChainError, read_provider};
use crate::config::AppConfig;

/// Message a wallet signs (EIP-191 `personal_sign`) to unlock content.
pub fn access_message(slug: &str) -> String {
    format!("TokenCrafter access: {slug}")
}

/// Address that produced `signature` over the access message for `slug`.
pub fn recover_signer(slug: &str, signature: &str) -> Option<Address> {
    let signature = Signature::from_str(signature.trim()).ok()?;
    signature
        .recover_address_from_msg(access_message(slug))
        .ok()
}

#[instrument(skip(config))]
pub async fn token_balance(
    config: &AppConfig,
    chain_id: u64,
    token: Address,
    holder: Address,
) -> Result<U256, ChainError> {
    let provider = read_provider(config, chain_id)?;
    let contract = IERC20::new(token, &provider);
    Ok(contract.balanceOf(holder).call().await?)
}
