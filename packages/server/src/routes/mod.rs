//! URL layout of the public API.

mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// Prefix every versioned router is mounted under.
pub const API_PREFIX: &str = "/api";

/// All versions of the API, relative to [`API_PREFIX`].
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes())
}
