use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::ai::{ContentGenerator, logo_prompt, text_prompt};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::ai::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/text",
    tag = "AI",
    operation_id = "generateText",
    summary = "Generate marketing copy",
    description = "Writes a description, tagline or launch tweet for a token through a chat-completion model.",
    request_body = GenerateTextRequest,
    responses(
        (status = 200, description = "Generated text", body = GenerateTextResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Model call failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(kind = ?payload.kind))]
pub async fn generate_text(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateTextRequest>,
) -> Result<Json<GenerateTextResponse>, AppError> {
    validate_text_request(&payload)?;
    let prompt = text_prompt(
        payload.kind,
        payload.name.trim(),
        payload.ticker.trim(),
        payload.context.as_deref(),
    );
    let text = ContentGenerator::new(&state.config.openai, &state.http)
        .generate_text(payload.kind, &prompt)
        .await?;
    Ok(Json(GenerateTextResponse { text }))
}

#[utoipa::path(
    post,
    path = "/logo",
    tag = "AI",
    operation_id = "generateLogo",
    summary = "Generate a token logo",
    description = "Generates a logo image and returns its URL (or a `data:` URL).",
    request_body = GenerateLogoRequest,
    responses(
        (status = 200, description = "Generated logo", body = GenerateLogoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Image call failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload))]
pub async fn generate_logo(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateLogoRequest>,
) -> Result<Json<GenerateLogoResponse>, AppError> {
    validate_logo_request(&payload)?;
    let prompt = logo_prompt(
        payload.name.trim(),
        payload.ticker.trim(),
        payload.style.as_deref(),
    );
    let url = ContentGenerator::new(&state.config.openai, &state.http)
        .generate_logo(&prompt)
        .await?;
    Ok(Json(GenerateLogoResponse { url }))
}
