use alloy::primitives::{Address, B256, U256};
use alloy::providers::Provider;
use tracing::{info, instrument, warn};

use super::erc20::IERC20;
use super::{ChainError, boosted_fees, format_token_amount, platform_provider};
use crate::config::AppConfig;

/// Largest recipient list accepted in one request.
pub const MAX_RECIPIENTS: usize = 200;

#[derive(Debug, Clone)]
pub struct Transfer {
    pub to: Address,
    /// Base units.
    pub amount: U256,
}

#[derive(Debug, Clone)]
pub struct SubmittedTransfer {
    pub to: Address,
    pub amount: U256,
    pub tx_hash: B256,
}

/// Sum of all transfer amounts, or `None` on overflow.
pub fn total_amount(transfers: &[Transfer]) -> Option<U256> {
    transfers
        .iter()
        .try_fold(U256::ZERO, |acc, t| acc.checked_add(t.amount))
}

/// Move tokens from `owner` to every recipient through `transferFrom`,
/// spending the allowance the owner granted the platform wallet.
///
/// The allowance is checked up front so a short allowance fails the whole
/// batch before anything is sent. Nonces are assigned sequentially from the
/// pending count; a failed submission stops the batch and is reported with
/// the hashes already sent.
#[instrument(skip(config, transfers), fields(count = transfers.len()))]
pub async fn execute(
    config: &AppConfig,
    chain_id: u64,
    token: Address,
    owner: Address,
    transfers: &[Transfer],
) -> Result<Vec<SubmittedTransfer>, ChainError> {
    let (provider, operator) = platform_provider(config, chain_id)?;
    let contract = IERC20::new(token, &provider);

    let required = total_amount(transfers)
        .ok_or_else(|| ChainError::InvalidAmount("total overflows uint256".into()))?;
    let allowance = contract.allowance(owner, operator).call().await?;
    if allowance < required {
        return Err(ChainError::InsufficientAllowance {
            allowance: format_token_amount(allowance),
            required: format_token_amount(required),
        });
    }

    let fees = boosted_fees(&provider, config.deploy.gas_bump_percent).await?;
    let mut nonce = provider.get_transaction_count(operator).pending().await?;
    let mut submitted = Vec::with_capacity(transfers.len());

    for transfer in transfers {
        let sent = contract
            .transferFrom(owner, transfer.to, transfer.amount)
            .from(operator)
            .nonce(nonce)
            .max_fee_per_gas(fees.max_fee_per_gas)
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            .send()
            .await;

        match sent {
            Ok(pending) => {
                submitted.push(SubmittedTransfer {
                    to: transfer.to,
                    amount: transfer.amount,
                    tx_hash: *pending.tx_hash(),
                });
                nonce += 1;
            }
            Err(e) => {
                warn!(
                    %token,
                    to = %transfer.to,
                    sent = submitted.len(),
                    error = %e,
                    "Airdrop transfer failed, stopping batch"
                );
                if submitted.is_empty() {
                    return Err(e.into());
                }
                break;
            }
        }
    }

    info!(%token, %owner, sent = submitted.len(), "Airdrop submitted");
    Ok(submitted)
}
