pub mod ai;
pub mod billing;
pub mod chain;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod explorer;
pub mod extractors;
pub mod handlers;
pub mod ledger;
pub mod market;
pub mod models;
pub mod quota;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TokenCrafter API",
        version = "1.0.0",
        description = "Backend of the TokenCrafter ERC-20 launch platform"
    ),
    tags(
        (name = "Profile", description = "Caller profile, plan and usage"),
        (name = "Projects", description = "Token project drafts and deployed tokens"),
        (name = "Favorites", description = "Bookmarked projects"),
        (name = "Billing", description = "Subscription checkout and billing portal"),
        (name = "Deployments", description = "Token deployment and deployment records"),
        (name = "Airdrops", description = "Batch token transfers from the platform wallet"),
        (name = "AI", description = "Generated marketing copy and logos"),
        (name = "Verification", description = "Block-explorer source verification"),
        (name = "Market", description = "Cached DEX market data"),
        (name = "Locked Content", description = "Token-gated content"),
        (name = "Webhooks", description = "Payment-provider callbacks"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    // Unparseable origins are skipped; an empty list allows no cross-origin calls.
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest(routes::API_PREFIX, routes::api_routes())
        .split_for_parts();

    router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
}
