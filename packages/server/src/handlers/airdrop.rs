use axum::Json;
use axum::extract::State;
use tracing::{info, instrument};

use crate::chain::{self, airdrop::Transfer};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::project::find_owned_project;
use crate::models::airdrop::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Airdrops",
    operation_id = "executeAirdrop",
    summary = "Airdrop tokens of a deployed project",
    description = "Sends `transferFrom(owner, recipient, amount)` from the platform wallet for every recipient (max 200). The project owner must have approved the platform wallet for at least the total; the allowance is checked before anything is sent. Returns one pending transaction per recipient sent.",
    request_body = AirdropRequest,
    responses(
        (status = 200, description = "Transfers submitted", body = AirdropResponse),
        (status = 400, description = "Invalid recipients, amounts or allowance too low (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Project not deployed (CONFLICT)", body = ErrorBody),
        (status = 500, description = "RPC failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = payload.project_id, recipients = payload.recipients.len()))]
pub async fn execute_airdrop(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AirdropRequest>,
) -> Result<Json<AirdropResponse>, AppError> {
    validate_airdrop_request(&payload)?;
    let project = find_owned_project(&state.db, payload.project_id, &auth_user).await?;

    let (Some(contract), Some(owner)) = (
        project.contract_address.as_deref(),
        project.owner_address.as_deref(),
    ) else {
        return Err(AppError::Conflict("Project is not deployed".into()));
    };
    let token = chain::parse_address(contract)?;
    let owner = chain::parse_address(owner)?;

    let transfers = payload
        .recipients
        .iter()
        .map(|r| {
            Ok(Transfer {
                to: chain::parse_address(&r.address)?,
                amount: chain::parse_token_amount(&r.amount)?,
            })
        })
        .collect::<Result<Vec<_>, chain::ChainError>>()?;

    let operator = chain::platform_signer(&state.config.deploy)?.address();
    let chain_id = project.chain_id as u64;
    let submitted =
        chain::airdrop::execute(&state.config, chain_id, token, owner, &transfers).await?;

    let complete = submitted.len() == transfers.len();
    info!(chain_id, %token, sent = submitted.len(), complete, "Airdrop finished");

    Ok(Json(AirdropResponse {
        operator: operator.to_checksum(None),
        complete,
        transfers: submitted
            .into_iter()
            .map(|t| AirdropTransfer {
                address: t.to.to_checksum(None),
                amount: chain::format_token_amount(t.amount),
                tx_hash: t.tx_hash.to_string(),
            })
            .collect(),
    }))
}
