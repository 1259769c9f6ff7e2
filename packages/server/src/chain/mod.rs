//! EVM access through the platform wallet.

pub mod airdrop;
pub mod deploy;
pub mod erc20;
pub mod gate;

use std::str::FromStr;

use alloy::network::EthereumWallet;
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use alloy::transports::http::reqwest::Url;

use crate::config::{AppConfig, DeployConfig};
use crate::error::AppError;

/// Token decimals used by every contract the platform deploys.
pub const TOKEN_DECIMALS: u8 = 18;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("chain {0} is not supported")]
    UnsupportedChain(u64),
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("platform wallet balance {balance} is not above the {required} safety threshold")]
    InsufficientFunds { balance: String, required: String },
    #[error("allowance {allowance} does not cover {required}")]
    InsufficientAllowance { allowance: String, required: String },
    #[error("chain configuration error: {0}")]
    Config(String),
    #[error("RPC error: {0}")]
    Rpc(#[from] TransportError),
    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),
}

impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::UnsupportedChain(_)
            | ChainError::InvalidAddress(_)
            | ChainError::InvalidAmount(_)
            | ChainError::InsufficientAllowance { .. } => AppError::Validation(err.to_string()),
            ChainError::InsufficientFunds { .. } => AppError::InsufficientFunds(err.to_string()),
            ChainError::Config(msg) => AppError::Internal(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

pub fn parse_address(raw: &str) -> Result<Address, ChainError> {
    Address::from_str(raw.trim()).map_err(|_| ChainError::InvalidAddress(raw.to_string()))
}

/// Parse a whole-token decimal amount (e.g. `"1.5"`) into base units.
pub fn parse_token_amount(raw: &str) -> Result<U256, ChainError> {
    parse_ether(raw.trim()).map_err(|_| ChainError::InvalidAmount(raw.to_string()))
}

pub fn format_token_amount(amount: U256) -> String {
    format_ether(amount)
}

/// Raise a fee estimate by `percent`, clamping at `u128::MAX`.
pub fn bump_fee(fee: u128, percent: u64) -> u128 {
    let bumped = U256::from(fee) * U256::from(100 + u128::from(percent)) / U256::from(100u8);
    u128::try_from(bumped).unwrap_or(u128::MAX)
}

/// EIP-1559 fee caps used for platform-wallet transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostedFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Current network estimate, boosted so submissions are not stuck behind
/// a fee spike.
pub async fn boosted_fees<P: Provider>(
    provider: &P,
    percent: u64,
) -> Result<BoostedFees, ChainError> {
    let estimate = provider.estimate_eip1559_fees().await?;
    Ok(BoostedFees {
        max_fee_per_gas: bump_fee(estimate.max_fee_per_gas, percent),
        max_priority_fee_per_gas: bump_fee(estimate.max_priority_fee_per_gas, percent),
    })
}

/// RPC endpoint for a chain, or `UnsupportedChain` when the chain is unknown
/// or has no endpoint configured.
pub fn rpc_url(config: &AppConfig, chain_id: u64) -> Result<Url, ChainError> {
    if common::chain::find(chain_id).is_none() {
        return Err(ChainError::UnsupportedChain(chain_id));
    }
    let raw = config
        .chains
        .rpc_url(chain_id)
        .ok_or(ChainError::UnsupportedChain(chain_id))?;
    raw.parse()
        .map_err(|e| ChainError::Config(format!("invalid RPC URL for chain {chain_id}: {e}")))
}

pub fn platform_signer(deploy: &DeployConfig) -> Result<PrivateKeySigner, ChainError> {
    PrivateKeySigner::from_str(deploy.private_key.trim())
        .map_err(|_| ChainError::Config("platform private key is not a valid secp256k1 key".into()))
}

/// Provider that signs with the platform wallet, plus that wallet's address.
pub fn platform_provider(
    config: &AppConfig,
    chain_id: u64,
) -> Result<(impl Provider + Clone, Address), ChainError> {
    let url = rpc_url(config, chain_id)?;
    let signer = platform_signer(&config.deploy)?;
    let address = signer.address();
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url);
    Ok((provider, address))
}

/// Read-only provider for a chain.
pub fn read_provider(config: &AppConfig, chain_id: u64) -> Result<impl Provider, ChainError> {
    let url = rpc_url(config, chain_id)?;
    Ok(ProviderBuilder::new().connect_http(url))
}
