//! ERC-20 contract creation from the platform wallet.
//!
//! Submission returns as soon as the node accepts the transaction. The
//! contract address is derived from the sender and nonce, so callers never
//! wait for a receipt.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolValue;
use tracing::{info, instrument};

use super::{
    ChainError, boosted_fees, format_token_amount, parse_token_amount, platform_provider,
};
use crate::config::AppConfig;

/// Constructor arguments of the platform ERC-20.
#[derive(Debug, Clone)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    /// Supply in base units (already scaled by 10^18).
    pub initial_supply: U256,
    /// Receives the supply and contract ownership.
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedDeployment {
    pub contract_address: Address,
    pub tx_hash: B256,
    pub deployer: Address,
    pub nonce: u64,
}

/// Extract creation bytecode from a Hardhat (`"bytecode": "0x.."`) or
/// Foundry (`"bytecode": {"object": "0x.."}`) artifact.
pub fn parse_artifact_bytecode(artifact: &serde_json::Value) -> Result<Bytes, ChainError> {
    let bytecode = &artifact["bytecode"];
    let hex_code = bytecode
        .as_str()
        .or_else(|| bytecode["object"].as_str())
        .ok_or_else(|| ChainError::Config("artifact has no bytecode".into()))?;
    let raw = hex::decode(hex_code.trim_start_matches("0x"))
        .map_err(|e| ChainError::Config(format!("artifact bytecode is not hex: {e}")))?;
    if raw.is_empty() {
        return Err(ChainError::Config("artifact bytecode is empty".into()));
    }
    Ok(Bytes::from(raw))
}

pub async fn load_creation_code(path: &str) -> Result<Bytes, ChainError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ChainError::Config(format!("cannot read artifact {path}: {e}")))?;
    let artifact: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| ChainError::Config(format!("artifact {path} is not JSON: {e}")))?;
    parse_artifact_bytecode(&artifact)
}

/// ABI-encoded `(string name, string symbol, uint256 supply, address owner)`.
pub fn constructor_args(spec: &TokenSpec) -> Vec<u8> {
    (
        spec.name.clone(),
        spec.symbol.clone(),
        spec.initial_supply,
        spec.owner,
    )
        .abi_encode_params()
}

/// Creation bytecode followed by the encoded constructor arguments.
pub fn creation_payload(code: &[u8], spec: &TokenSpec) -> Bytes {
    let mut payload = code.to_vec();
    payload.extend_from_slice(&constructor_args(spec));
    Bytes::from(payload)
}

/// Submit the contract-creation transaction for `spec` on `chain_id`.
///
/// Aborts before sending when the platform wallet does not hold more than
/// the configured safety balance.
#[instrument(skip(config, spec), fields(symbol = %spec.symbol, owner = %spec.owner))]
pub async fn submit(
    config: &AppConfig,
    chain_id: u64,
    spec: &TokenSpec,
) -> Result<SubmittedDeployment, ChainError> {
    let (provider, deployer) = platform_provider(config, chain_id)?;

    let required = parse_token_amount(&config.deploy.min_balance)
        .map_err(|_| ChainError::Config("deploy.min_balance is not a decimal amount".into()))?;
    let balance = provider.get_balance(deployer).await?;
    if balance <= required {
        return Err(ChainError::InsufficientFunds {
            balance: format_token_amount(balance),
            required: format_token_amount(required),
        });
    }

    let code = load_creation_code(&config.deploy.artifact_path).await?;
    let nonce = provider.get_transaction_count(deployer).pending().await?;
    let fees = boosted_fees(&provider, config.deploy.gas_bump_percent).await?;

    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_nonce(nonce)
        .with_max_fee_per_gas(fees.max_fee_per_gas)
        .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
        .with_deploy_code(creation_payload(&code, spec));

    let pending = provider.send_transaction(tx).await?;
    let tx_hash = *pending.tx_hash();
    let contract_address = deployer.create(nonce);

    info!(
        chain_id,
        %deployer,
        nonce,
        %contract_address,
        %tx_hash,
        max_fee_per_gas = fees.max_fee_per_gas,
        "Deployment submitted"
    );

    Ok(SubmittedDeployment {
        contract_address,
        tx_hash,
        deployer,
        nonce,
    })
}
