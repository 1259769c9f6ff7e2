use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{debug, info, instrument};

use crate::entity::project;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::handlers::project::find_project;
use crate::market::{MarketClient, is_fresh};
use crate::models::market::MarketResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/market/refresh",
    tag = "Market",
    operation_id = "refreshMarketData",
    summary = "Refresh cached market data",
    description = "Fetches price, market cap, 24h volume and liquidity of a deployed token from DexScreener and stores them on the project. Figures younger than the configured minimum interval are returned as-is. A token without trading pairs keeps its previous figures.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Market data", body = MarketResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Project not deployed (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Market API failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn refresh_market(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MarketResponse>, AppError> {
    let existing = find_project(&state.db, id).await?;
    let Some(contract) = existing.contract_address.clone() else {
        return Err(AppError::Conflict("Project is not deployed".into()));
    };

    let now = Utc::now();
    if is_fresh(
        existing.market_updated_at,
        now,
        state.config.market.min_refresh_secs,
    ) {
        debug!("Market data still fresh");
        return Ok(Json(MarketResponse::from_model(&existing, true)));
    }

    let slug = common::chain::find(existing.chain_id as u64).and_then(|c| c.dexscreener_slug);
    let snapshot = MarketClient::new(&state.http, &state.config.market)
        .snapshot(&contract, slug)
        .await?;
    let Some(snapshot) = snapshot else {
        return Ok(Json(MarketResponse::from_model(&existing, false)));
    };

    let mut active: project::ActiveModel = existing.into();
    active.market_cap = Set(snapshot.market_cap);
    active.volume_24h = Set(snapshot.volume_24h);
    active.liquidity_usd = Set(snapshot.liquidity_usd);
    active.price_usd = Set(snapshot.price_usd);
    active.market_updated_at = Set(Some(now));
    let updated = active.update(&state.db).await?;

    info!(market_cap = ?updated.market_cap, "Market data refreshed");
    Ok(Json(MarketResponse::from_model(&updated, false)))
}
