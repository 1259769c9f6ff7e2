//! Stripe integration: REST client, webhook signatures and plan synchronization.

pub mod client;
pub mod event;
pub mod signature;
pub mod sync;

use sea_orm::DbErr;

use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),
    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Stripe request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed Stripe payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidSignature(msg) => AppError::WebhookSignature(msg),
            BillingError::Payload(e) => AppError::Validation(format!("Malformed event: {e}")),
            BillingError::Db(e) => AppError::Internal(e.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}
