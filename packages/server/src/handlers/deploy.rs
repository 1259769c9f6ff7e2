use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::{info, instrument};

use crate::chain::{self, deploy::TokenSpec};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::profile::ensure_profile;
use crate::handlers::project::find_owned_project;
use crate::ledger::{DeploymentRecord, LedgerWriter, NewProject};
use crate::models::deploy::*;
use crate::models::project::{ProjectResponse, normalize_ticker};
use crate::models::shared::normalize_optional;
use crate::quota::QuotaService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Deployments",
    operation_id = "deployToken",
    summary = "Deploy a paid project",
    description = "Checks ownership, payment and plan limits, then submits the contract-creation transaction from the platform wallet and returns the precomputed contract address and pending hash without waiting for confirmation. If the transaction was sent but the project row could not be updated, the response still succeeds with `persisted: false`.",
    request_body = DeployRequest,
    responses(
        (status = 201, description = "Deployment submitted", body = DeployResponse),
        (status = 400, description = "Invalid owner address or unsupported chain (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner, unpaid, or plan limit reached (PERMISSION_DENIED, PROJECT_NOT_PAID, PLAN_LIMIT_REACHED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already deployed (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Platform wallet underfunded or RPC failure (INSUFFICIENT_FUNDS, UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = payload.project_id))]
pub async fn deploy_token(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeployRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = chain::parse_address(&payload.owner_address)?;
    let project = find_owned_project(&state.db, payload.project_id, &auth_user).await?;

    if project.is_deployed() {
        return Err(AppError::Conflict("Project is already deployed".into()));
    }
    if !project.is_paid {
        return Err(AppError::ProjectNotPaid);
    }

    let chain_id = project.chain_id as u64;
    QuotaService::new(&state.db)
        .ensure_can_deploy(auth_user.user_id, chain_id)
        .await?;

    let initial_supply = chain::parse_token_amount(&project.initial_supply)?;
    let spec = TokenSpec {
        name: project.name.clone(),
        symbol: project.ticker.clone(),
        initial_supply,
        owner,
    };
    let submitted = chain::deploy::submit(&state.config, chain_id, &spec).await?;

    let contract_address = submitted.contract_address.to_checksum(None);
    let tx_hash = submitted.tx_hash.to_string();
    let record = DeploymentRecord {
        user_id: auth_user.user_id,
        project_id: Some(project.id),
        chain_id,
        contract_address: contract_address.clone(),
        tx_hash: tx_hash.clone(),
        owner_address: owner.to_checksum(None),
        metadata: None,
    };
    let persisted = LedgerWriter::new(&state.db)
        .record_submitted(&record)
        .await
        .is_some();

    info!(chain_id, %contract_address, %tx_hash, persisted, "Token deployment submitted");
    Ok((
        StatusCode::CREATED,
        Json(DeployResponse {
            project_id: project.id,
            chain_id,
            explorer_tx_url: common::chain::find(chain_id).map(|c| c.tx_url(&tx_hash)),
            contract_address,
            tx_hash,
            persisted,
            submitted_at: Utc::now(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/record",
    tag = "Deployments",
    operation_id = "recordDeployment",
    summary = "Record a deployment made elsewhere",
    description = "Persists a deployment the caller sent from their own wallet. Updates the given paid project, or creates one from the supplied metadata. Recording onto a project that is not deployed yet counts against the plan limits. Replaying the stored deployment of a deployed project returns it unchanged; any other deployment onto it is a conflict.",
    request_body = RecordDeploymentRequest,
    responses(
        (status = 200, description = "Deployment recorded", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner, unpaid, or plan limit reached (PERMISSION_DENIED, PROJECT_NOT_PAID, PLAN_LIMIT_REACHED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Project already deployed differently (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(chain_id = payload.chain_id, project_id = ?payload.project_id))]
pub async fn record_deployment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RecordDeploymentRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    validate_record_request(&payload)?;
    let contract = chain::parse_address(&payload.contract_address)?;
    let owner = chain::parse_address(&payload.owner_address)?;
    ensure_profile(&state.db, &auth_user).await?;

    // A deployed project only accepts an exact replay of its deployment,
    // which the ledger checks; it does not count against the plan again.
    let already_deployed = match payload.project_id {
        Some(id) => {
            let project = find_owned_project(&state.db, id, &auth_user).await?;
            if !project.is_deployed() && !project.is_paid {
                return Err(AppError::ProjectNotPaid);
            }
            project.is_deployed()
        }
        None => false,
    };
    if !already_deployed {
        QuotaService::new(&state.db)
            .ensure_can_deploy(auth_user.user_id, payload.chain_id)
            .await?;
    }

    let metadata = match (payload.name, payload.ticker, payload.initial_supply) {
        (Some(name), Some(ticker), Some(initial_supply)) => Some(NewProject {
            name: name.trim().to_string(),
            ticker: normalize_ticker(&ticker),
            initial_supply: initial_supply.trim().to_string(),
            description: normalize_optional(payload.description),
            logo_url: normalize_optional(payload.logo_url),
        }),
        _ => None,
    };
    let record = DeploymentRecord {
        user_id: auth_user.user_id,
        project_id: payload.project_id,
        chain_id: payload.chain_id,
        contract_address: contract.to_checksum(None),
        tx_hash: payload.tx_hash.to_ascii_lowercase(),
        owner_address: owner.to_checksum(None),
        metadata,
    };

    let model = LedgerWriter::new(&state.db).record(&record).await?;
    info!(project_id = model.id, contract = %record.contract_address, "Deployment recorded");
    Ok(Json(model.into()))
}
