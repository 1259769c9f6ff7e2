use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::profile::me))
        .nest("/projects", project_routes())
        .nest("/favorites", favorite_routes())
        .nest("/locked-content", locked_content_routes())
        .nest("/billing", billing_routes())
        .nest("/deployments", deployment_routes())
        .nest("/airdrops", airdrop_routes())
        .nest("/ai", ai_routes())
        .nest("/webhooks", webhook_routes())
}

fn project_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::project::list_projects,
            handlers::project::create_project
        ))
        .routes(routes!(handlers::project::explore_projects))
        .routes(routes!(
            handlers::project::get_project,
            handlers::project::update_project,
            handlers::project::delete_project
        ))
        .routes(routes!(handlers::project::unlock_project))
        .routes(routes!(
            handlers::project::add_favorite,
            handlers::project::remove_favorite
        ))
        .routes(routes!(handlers::market::refresh_market))
        .routes(routes!(handlers::verify::submit_verification))
        .routes(routes!(handlers::verify::verification_status))
        .routes(routes!(
            handlers::locked_content::list_locked_content,
            handlers::locked_content::create_locked_content
        ))
}

fn favorite_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::project::list_favorites))
}

fn locked_content_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::locked_content::delete_locked_content))
        .routes(routes!(handlers::locked_content::access_locked_content))
}

fn billing_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::billing::create_checkout))
        .routes(routes!(handlers::billing::create_portal))
}

fn deployment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::deploy::deploy_token))
        .routes(routes!(handlers::deploy::record_deployment))
}

fn airdrop_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::airdrop::execute_airdrop))
}

fn ai_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::ai::generate_text))
        .routes(routes!(handlers::ai::generate_logo))
}

fn webhook_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::billing::stripe_webhook))
}
