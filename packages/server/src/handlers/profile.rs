use axum::Json;
use axum::extract::State;
use chrono::Utc;
use common::Plan;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::profile::ProfileResponse;
use crate::quota::{QuotaService, resolve_plan};
use crate::state::AppState;

/// Load the caller's profile, creating a free-plan row on first access.
pub(crate) async fn ensure_profile<C: ConnectionTrait>(
    conn: &C,
    auth_user: &AuthUser,
) -> Result<profile::Model, AppError> {
    if let Some(existing) = profile::Entity::find_by_id(auth_user.user_id)
        .one(conn)
        .await?
    {
        return Ok(existing);
    }

    let now = Utc::now();
    let model = profile::ActiveModel {
        id: Set(auth_user.user_id),
        email: Set(auth_user.email.clone()),
        plan_activo: Set(Plan::Free.as_str().to_string()),
        stripe_customer_id: Set(None),
        stripe_subscription_id: Set(None),
        subscription_status: Set(None),
        subscription_period_end: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // Two first requests can race; the loser simply reads the winner's row.
    match profile::Entity::insert(model)
        .on_conflict(
            OnConflict::column(profile::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }
    info!(user_id = %auth_user.user_id, "Created profile");

    profile::Entity::find_by_id(auth_user.user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal("profile missing after insert".into()))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Profile",
    operation_id = "getProfile",
    summary = "Get the current user's profile",
    description = "Returns the caller's profile with plan, subscription state, plan limits and deployment usage per supported chain. The profile is created on first access.",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let model = ensure_profile(&state.db, &auth_user).await?;
    let plan = resolve_plan(&model.plan_activo);
    let usage = QuotaService::new(&state.db).usage(auth_user.user_id).await?;
    Ok(Json(ProfileResponse::new(model, plan, &usage)))
}
