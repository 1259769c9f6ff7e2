use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, NullOrdering, OnConflict};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{favorite, locked_content, profile, project};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::profile::ensure_profile;
use crate::models::project::*;
use crate::models::shared::{escape_like, normalize_optional, page_params};
use crate::quota::resolve_plan;
use crate::state::AppState;

pub(crate) async fn find_project<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<project::Model, AppError> {
    project::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

/// Load a project and require the caller to own it.
pub(crate) async fn find_owned_project<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    auth_user: &AuthUser,
) -> Result<project::Model, AppError> {
    let model = find_project(conn, id).await?;
    auth_user.require_owner(model.user_id)?;
    Ok(model)
}

/// Deployed projects are public; drafts are visible to their owner only.
fn require_visible(model: &project::Model, auth_user: &AuthUser) -> Result<(), AppError> {
    if model.is_deployed() || model.user_id == auth_user.user_id {
        Ok(())
    } else {
        Err(AppError::NotFound("Project not found".into()))
    }
}

fn search_condition(term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(term).to_lowercase());
    Condition::any()
        .add(
            Expr::expr(Func::lower(Expr::col(project::Column::Name)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
        .add(
            Expr::expr(Func::lower(Expr::col(project::Column::Ticker)))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
}

async fn paginate<C: ConnectionTrait>(
    conn: &C,
    select: Select<project::Entity>,
    page: u64,
    per_page: u64,
) -> Result<ProjectListResponse, AppError> {
    let total = select.clone().paginate(conn, per_page).num_items().await?;
    let data = select
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(conn)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();
    Ok(ProjectListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    })
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Create a token project",
    description = "Creates an unpaid, undeployed token project owned by the caller. The ticker is stored uppercase.",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(ticker = %payload.ticker))]
pub async fn create_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_project(&payload)?;
    ensure_profile(&state.db, &auth_user).await?;

    let now = Utc::now();
    let model = project::ActiveModel {
        user_id: Set(auth_user.user_id),
        name: Set(payload.name.trim().to_string()),
        ticker: Set(normalize_ticker(&payload.ticker)),
        description: Set(normalize_optional(payload.description)),
        logo_url: Set(normalize_optional(payload.logo_url)),
        chain_id: Set(payload.chain_id as i64),
        initial_supply: Set(payload.initial_supply.trim().to_string()),
        owner_address: Set(None),
        contract_address: Set(None),
        tx_hash: Set(None),
        deployed_at: Set(None),
        is_paid: Set(false),
        is_renounced: Set(false),
        is_locked: Set(false),
        website: Set(normalize_optional(payload.website)),
        twitter: Set(normalize_optional(payload.twitter)),
        telegram: Set(normalize_optional(payload.telegram)),
        discord: Set(normalize_optional(payload.discord)),
        market_cap: Set(None),
        volume_24h: Set(None),
        liquidity_usd: Set(None),
        price_usd: Set(None),
        market_updated_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(project_id = model.id, "Project created");
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List the caller's projects",
    description = "Returns the caller's projects, newest first, with optional case-insensitive search on name and ticker.",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Projects", body = ProjectListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_projects(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = project::Entity::find().filter(project::Column::UserId.eq(auth_user.user_id));
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(search_condition(term));
    }
    let select = select
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id);

    Ok(Json(paginate(&state.db, select, page, per_page).await?))
}

#[utoipa::path(
    get,
    path = "/explore",
    tag = "Projects",
    operation_id = "exploreProjects",
    summary = "Browse deployed projects",
    description = "Public listing of deployed projects, ordered by cached market cap (unknown last), then most recently deployed.",
    params(ExploreQuery),
    responses(
        (status = 200, description = "Deployed projects", body = ProjectListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn explore_projects(
    State(state): State<AppState>,
    Query(query): Query<ExploreQuery>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = project::Entity::find().filter(project::Column::ContractAddress.is_not_null());
    if let Some(chain_id) = query.chain_id {
        select = select.filter(project::Column::ChainId.eq(chain_id as i64));
    }
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(search_condition(term));
    }
    let select = select
        .order_by_with_nulls(project::Column::MarketCap, Order::Desc, NullOrdering::Last)
        .order_by_desc(project::Column::DeployedAt)
        .order_by_desc(project::Column::Id);

    Ok(Json(paginate(&state.db, select, page, per_page).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project",
    description = "Returns a project. Undeployed projects are only visible to their owner.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    let model = find_project(&state.db, id).await?;
    require_visible(&model, &auth_user)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Update a project",
    description = "Partially updates a project owned by the caller. Name, ticker, chain and supply are frozen once deployed (409). `is_locked` and `is_renounced` can only be set on deployed projects.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Token fields of a deployed project (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    validate_update_project(&payload)?;

    if payload == UpdateProjectRequest::default() {
        let existing = find_owned_project(&state.db, id, &auth_user).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_owned_project(&txn, id, &auth_user).await?;

    if existing.is_deployed() && payload.touches_token_fields() {
        return Err(AppError::Conflict(
            "Name, ticker, chain and supply cannot change after deployment".into(),
        ));
    }
    if !existing.is_deployed() && (payload.is_locked.is_some() || payload.is_renounced.is_some()) {
        return Err(AppError::Validation(
            "is_locked and is_renounced apply to deployed projects only".into(),
        ));
    }

    let mut active: project::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref ticker) = payload.ticker {
        active.ticker = Set(normalize_ticker(ticker));
    }
    if let Some(chain_id) = payload.chain_id {
        active.chain_id = Set(chain_id as i64);
    }
    if let Some(ref supply) = payload.initial_supply {
        active.initial_supply = Set(supply.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(normalize_optional(description));
    }
    if let Some(logo_url) = payload.logo_url {
        active.logo_url = Set(normalize_optional(logo_url));
    }
    if let Some(website) = payload.website {
        active.website = Set(normalize_optional(website));
    }
    if let Some(twitter) = payload.twitter {
        active.twitter = Set(normalize_optional(twitter));
    }
    if let Some(telegram) = payload.telegram {
        active.telegram = Set(normalize_optional(telegram));
    }
    if let Some(discord) = payload.discord {
        active.discord = Set(normalize_optional(discord));
    }
    if let Some(is_locked) = payload.is_locked {
        active.is_locked = Set(is_locked);
    }
    if let Some(is_renounced) = payload.is_renounced {
        active.is_renounced = Set(is_renounced);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project",
    description = "Deletes an undeployed project owned by the caller, with its locked content and bookmarks. Deployed projects cannot be deleted (409).",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Project is deployed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_owned_project(&txn, id, &auth_user).await?;
    if existing.is_deployed() {
        return Err(AppError::Conflict(
            "Deployed projects cannot be deleted".into(),
        ));
    }

    locked_content::Entity::delete_many()
        .filter(locked_content::Column::ProjectId.eq(id))
        .exec(&txn)
        .await?;
    favorite::Entity::delete_many()
        .filter(favorite::Column::ProjectId.eq(id))
        .exec(&txn)
        .await?;
    project::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/unlock",
    tag = "Projects",
    operation_id = "unlockProject",
    summary = "Unlock a project with the current subscription",
    description = "Marks a project paid when the caller has an active or trialing subscription on a paid plan. Idempotent for projects already paid.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project unlocked", body = ProjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner or no active paid subscription (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn unlock_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    let existing = find_owned_project(&state.db, id, &auth_user).await?;
    if existing.is_paid {
        return Ok(Json(existing.into()));
    }

    let owner = profile::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::PermissionDenied)?;
    let entitled = owner
        .subscription_status
        .is_some_and(|status| status.is_entitled());
    if !entitled || !resolve_plan(&owner.plan_activo).is_paid() {
        return Err(AppError::PermissionDenied);
    }

    let mut active: project::ActiveModel = existing.into();
    active.is_paid = Set(true);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    info!(project_id = id, plan = %owner.plan_activo, "Project unlocked by subscription");
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/favorite",
    tag = "Favorites",
    operation_id = "addFavorite",
    summary = "Bookmark a project",
    description = "Adds a visible project to the caller's favorites. Idempotent.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Bookmarked"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn add_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let model = find_project(&state.db, id).await?;
    require_visible(&model, &auth_user)?;
    ensure_profile(&state.db, &auth_user).await?;

    let row = favorite::ActiveModel {
        user_id: Set(auth_user.user_id),
        project_id: Set(id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    match favorite::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([favorite::Column::UserId, favorite::Column::ProjectId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    delete,
    path = "/{id}/favorite",
    tag = "Favorites",
    operation_id = "removeFavorite",
    summary = "Remove a bookmark",
    description = "Removes a project from the caller's favorites. Idempotent.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Bookmark removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn remove_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    favorite::Entity::delete_many()
        .filter(favorite::Column::UserId.eq(auth_user.user_id))
        .filter(favorite::Column::ProjectId.eq(id))
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Favorites",
    operation_id = "listFavorites",
    summary = "List bookmarked projects",
    description = "Returns the caller's bookmarked projects, most recently bookmarked first. Drafts of other users that were bookmarked before being hidden are skipped.",
    responses(
        (status = 200, description = "Bookmarked projects", body = Vec<ProjectResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_favorites(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let ids: Vec<i32> = favorite::Entity::find()
        .select_only()
        .column(favorite::Column::ProjectId)
        .filter(favorite::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(favorite::Column::CreatedAt)
        .into_tuple()
        .all(&state.db)
        .await?;

    let mut projects = project::Entity::find()
        .filter(project::Column::Id.is_in(ids.clone()))
        .all(&state.db)
        .await?;
    projects.retain(|p| require_visible(p, &auth_user).is_ok());
    // Keep bookmark order.
    projects.sort_by_key(|p| ids.iter().position(|id| *id == p.id));

    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}
