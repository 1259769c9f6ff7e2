use common::Plan;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Request body for starting a subscription checkout.
#[derive(Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Paid plan to subscribe to.
    #[schema(example = "pro")]
    pub plan: Plan,
    /// Project to mark paid once the checkout completes.
    #[schema(example = 12)]
    pub project_id: Option<i32>,
}

pub fn validate_checkout_request(req: &CheckoutRequest) -> Result<(), AppError> {
    if !req.plan.is_paid() {
        return Err(AppError::Validation(
            "Plan must be one of: basic, pro, enterprise".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, ToSchema)]
pub struct CheckoutResponse {
    #[schema(example = "cs_test_a1b2c3")]
    pub session_id: String,
    /// Hosted checkout page to redirect the user to.
    pub url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PortalResponse {
    pub url: String,
}

/// Acknowledgement returned to Stripe.
#[derive(Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}
