use axum::Json;
use axum::extract::{Path, State};
use tracing::{error, info, instrument};

use crate::chain::{self, deploy::TokenSpec};
use crate::entity::project;
use crate::error::{AppError, ErrorBody};
use crate::explorer::{ExplorerClient, VerificationRequest};
use crate::extractors::auth::AuthUser;
use crate::handlers::project::find_owned_project;
use crate::models::verify::*;
use crate::state::AppState;

fn deployed_contract(project: &project::Model) -> Result<(&str, &str), AppError> {
    match (
        project.contract_address.as_deref(),
        project.owner_address.as_deref(),
    ) {
        (Some(contract), Some(owner)) => Ok((contract, owner)),
        _ => Err(AppError::Conflict("Project is not deployed".into())),
    }
}

#[utoipa::path(
    post,
    path = "/{id}/verify",
    tag = "Verification",
    operation_id = "submitVerification",
    summary = "Submit contract source for verification",
    description = "Sends the platform token source and the project's constructor arguments to the block explorer. Poll the returned GUID for the result.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Submitted", body = VerifySubmitResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not deployed or already verified (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Explorer rejected the request (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn submit_verification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<VerifySubmitResponse>, AppError> {
    let project = find_owned_project(&state.db, id, &auth_user).await?;
    let (contract, owner) = deployed_contract(&project)?;

    let spec = TokenSpec {
        name: project.name.clone(),
        symbol: project.ticker.clone(),
        initial_supply: chain::parse_token_amount(&project.initial_supply)?,
        owner: chain::parse_address(owner)?,
    };
    let constructor_args = hex::encode(chain::deploy::constructor_args(&spec));

    let deploy = &state.config.deploy;
    let source = tokio::fs::read_to_string(&deploy.source_path)
        .await
        .map_err(|e| {
            error!(path = %deploy.source_path, error = %e, "Failed to read contract source");
            AppError::Internal("Contract source is unavailable".into())
        })?;

    let guid = ExplorerClient::new(&state.http, &state.config.explorer)
        .submit(
            &VerificationRequest {
                chain_id: project.chain_id as u64,
                contract_address: contract,
                source: &source,
                constructor_args: &constructor_args,
            },
            deploy,
        )
        .await?;

    info!(%guid, contract, "Verification submitted");
    Ok(Json(VerifySubmitResponse { guid }))
}

#[utoipa::path(
    get,
    path = "/{id}/verify/{guid}",
    tag = "Verification",
    operation_id = "getVerificationStatus",
    summary = "Poll a verification job",
    params(
        ("id" = i32, Path, description = "Project ID"),
        ("guid" = String, Path, description = "GUID returned on submission"),
    ),
    responses(
        (status = 200, description = "Current status", body = VerifyStatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Project not deployed (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Explorer call failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn verification_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, guid)): Path<(i32, String)>,
) -> Result<Json<VerifyStatusResponse>, AppError> {
    let project = find_owned_project(&state.db, id, &auth_user).await?;
    deployed_contract(&project)?;

    let report = ExplorerClient::new(&state.http, &state.config.explorer)
        .status(project.chain_id as u64, &guid)
        .await?;
    Ok(Json(VerifyStatusResponse {
        guid,
        status: report.status,
        detail: report.detail,
    }))
}
