use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument, warn};

use crate::billing::client::{CheckoutParams, StripeClient};
use crate::billing::event::Event;
use crate::billing::signature;
use crate::billing::sync::{PlanSynchronizer, SyncOutcome};
use crate::entity::profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::profile::ensure_profile;
use crate::handlers::project::find_owned_project;
use crate::models::billing::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/checkout",
    tag = "Billing",
    operation_id = "createCheckoutSession",
    summary = "Start a subscription checkout",
    description = "Creates the caller's Stripe customer on first use, then a subscription Checkout Session for the requested plan. When `project_id` is given, that project is marked paid once the checkout completes.",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Unknown or unpriced plan (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Project owned by someone else (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stripe call failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(plan = %payload.plan, project_id = ?payload.project_id))]
pub async fn create_checkout(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    validate_checkout_request(&payload)?;
    let price_id = state
        .config
        .stripe
        .price_for(payload.plan)
        .ok_or_else(|| {
            AppError::Validation(format!("No price is configured for plan {}", payload.plan))
        })?
        .to_string();

    if let Some(project_id) = payload.project_id {
        find_owned_project(&state.db, project_id, &auth_user).await?;
    }

    let stripe = StripeClient::new(&state.http, &state.config.stripe);
    let existing = ensure_profile(&state.db, &auth_user).await?;

    let customer_id = match existing.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let email = existing.email.clone().or(auth_user.email.clone());
            let customer = stripe
                .create_customer(auth_user.user_id, email.as_deref())
                .await?;
            let mut active: profile::ActiveModel = existing.into();
            active.stripe_customer_id = Set(Some(customer.id.clone()));
            active.updated_at = Set(Utc::now());
            active.update(&state.db).await?;
            info!(
                user_id = %auth_user.user_id,
                customer_id = %customer.id,
                "Created Stripe customer"
            );
            customer.id
        }
    };

    let session = stripe
        .create_checkout_session(CheckoutParams {
            customer_id: &customer_id,
            price_id: &price_id,
            user_id: auth_user.user_id,
            project_id: payload.project_id,
        })
        .await?;

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

#[utoipa::path(
    post,
    path = "/portal",
    tag = "Billing",
    operation_id = "createPortalSession",
    summary = "Open the billing portal",
    description = "Creates a Stripe customer-portal session where the caller can manage or cancel the subscription.",
    responses(
        (status = 200, description = "Portal session created", body = PortalResponse),
        (status = 400, description = "No billing account yet (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Stripe call failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn create_portal(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PortalResponse>, AppError> {
    let customer_id = profile::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .and_then(|p| p.stripe_customer_id)
        .ok_or_else(|| {
            AppError::Validation("No billing account exists; start a checkout first".into())
        })?;

    let session = StripeClient::new(&state.http, &state.config.stripe)
        .create_portal_session(&customer_id)
        .await?;
    Ok(Json(PortalResponse { url: session.url }))
}

#[utoipa::path(
    post,
    path = "/stripe",
    tag = "Webhooks",
    operation_id = "stripeWebhook",
    summary = "Stripe webhook endpoint",
    description = "Verifies the `Stripe-Signature` header against the raw body and applies subscription events to the matching profile. Events for unknown customers and unhandled event types are acknowledged.",
    request_body(content = String, content_type = "application/json", description = "Raw Stripe event"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Bad signature or payload (INVALID_SIGNATURE, VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Database failure; Stripe will retry (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, body), fields(len = body.len()))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let header = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::WebhookSignature("Missing Stripe-Signature header".into()))?;

    let stripe = &state.config.stripe;
    signature::verify(
        &body,
        header,
        &stripe.webhook_secret,
        stripe.webhook_tolerance_secs,
        Utc::now().timestamp(),
    )?;

    let event: Event = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed event: {e}")))?;
    let event_id = event.id.clone();
    let event_type = event.event_type.clone();

    let outcome = PlanSynchronizer::new(&state.db, stripe).apply(event).await?;
    match outcome {
        SyncOutcome::Applied { profile_id } => {
            info!(%event_id, %event_type, %profile_id, "Stripe event applied")
        }
        SyncOutcome::ProfileNotFound => {
            warn!(%event_id, %event_type, "Stripe event matched no profile")
        }
        SyncOutcome::Ignored => {}
    }

    Ok(Json(WebhookAck { received: true }))
}
