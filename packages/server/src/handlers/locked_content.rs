use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument, warn};

use crate::chain::{self, gate};
use crate::entity::{locked_content, project};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::project::{find_owned_project, find_project};
use crate::models::locked_content::*;
use crate::models::shared::normalize_optional;
use crate::state::AppState;

async fn find_by_slug<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
) -> Result<locked_content::Model, AppError> {
    locked_content::Entity::find()
        .filter(locked_content::Column::Slug.eq(slug))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Content not found".into()))
}

#[utoipa::path(
    get,
    path = "/{id}/locked-content",
    tag = "Locked Content",
    operation_id = "listLockedContent",
    summary = "List a project's token-gated content",
    description = "Public metadata of every gated item of a deployed project. Content URLs are only revealed through the access endpoint.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Items, newest first", body = Vec<LockedContentSummary>),
        (status = 404, description = "Project not found or not deployed (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_locked_content(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<LockedContentSummary>>, AppError> {
    let project = find_project(&state.db, id).await?;
    if !project.is_deployed() {
        return Err(AppError::NotFound("Project not found".into()));
    }

    let items = locked_content::Entity::find()
        .filter(locked_content::Column::ProjectId.eq(id))
        .order_by_desc(locked_content::Column::CreatedAt)
        .order_by_desc(locked_content::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/locked-content",
    tag = "Locked Content",
    operation_id = "createLockedContent",
    summary = "Add token-gated content",
    description = "Creates an item unlocked for wallets holding at least `min_balance` whole tokens of the project's contract. The project must be deployed.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = CreateLockedContentRequest,
    responses(
        (status = 201, description = "Item created", body = LockedContentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug taken or project not deployed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, title = %payload.title))]
pub async fn create_locked_content(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateLockedContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_locked_content(&payload)?;
    let project = find_owned_project(&state.db, id, &auth_user).await?;
    if !project.is_deployed() {
        return Err(AppError::Conflict(
            "Content can only be gated on a deployed token".into(),
        ));
    }

    let slug = match payload.slug {
        Some(slug) => slug,
        None => slug_from_title(&payload.title),
    };
    let new_item = locked_content::ActiveModel {
        project_id: Set(id),
        slug: Set(slug.clone()),
        title: Set(payload.title.trim().to_string()),
        description: Set(normalize_optional(payload.description)),
        content_type: Set(payload.content_type),
        content_url: Set(payload.content_url.trim().to_string()),
        min_balance: Set(payload.min_balance.trim().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_item.insert(&state.db).await {
        Ok(model) => {
            info!(content_id = model.id, slug = %model.slug, "Locked content created");
            Ok((StatusCode::CREATED, Json(LockedContentResponse::from(model))))
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
            AppError::Conflict(format!("Slug '{slug}' is already in use")),
        ),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Locked Content",
    operation_id = "deleteLockedContent",
    summary = "Delete token-gated content",
    params(("slug" = String, Path, description = "Content slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the project owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(slug))]
pub async fn delete_locked_content(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    let item = find_by_slug(&state.db, &slug).await?;
    find_owned_project(&state.db, item.project_id, &auth_user).await?;

    locked_content::Entity::delete_by_id(item.id)
        .exec(&state.db)
        .await?;
    info!(content_id = item.id, "Locked content deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{slug}/access",
    tag = "Locked Content",
    operation_id = "accessLockedContent",
    summary = "Unlock content with a wallet signature",
    description = "The wallet signs `TokenCrafter access: {slug}` with `personal_sign`. When the signature recovers to `wallet_address` and that wallet holds at least the required balance of the project's token, the content URL is returned.",
    params(("slug" = String, Path, description = "Content slug")),
    request_body = AccessRequest,
    responses(
        (status = 200, description = "Access granted", body = AccessResponse),
        (status = 400, description = "Malformed wallet address (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Bad signature or balance too low (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "RPC failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(slug, wallet = %payload.wallet_address))]
pub async fn access_locked_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<AccessRequest>,
) -> Result<Json<AccessResponse>, AppError> {
    let wallet = chain::parse_address(&payload.wallet_address)?;
    let item = find_by_slug(&state.db, &slug).await?;

    if gate::recover_signer(&item.slug, &payload.signature) != Some(wallet) {
        warn!("Access signature does not match wallet");
        return Err(AppError::PermissionDenied);
    }

    let project: project::Model = find_project(&state.db, item.project_id).await?;
    let Some(contract) = project.contract_address.as_deref() else {
        return Err(AppError::NotFound("Content not found".into()));
    };
    let token = chain::parse_address(contract)?;
    let required = chain::parse_token_amount(&item.min_balance)?;
    let balance = gate::token_balance(&state.config, project.chain_id as u64, token, wallet).await?;

    if balance < required {
        info!(%balance, %required, "Balance below gate threshold");
        return Err(AppError::PermissionDenied);
    }

    Ok(Json(AccessResponse {
        slug: item.slug,
        title: item.title,
        content_type: item.content_type,
        content_url: item.content_url,
    }))
}
