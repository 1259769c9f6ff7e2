use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::BillingError;
use crate::config::StripeConfig;

/// Minimal form-encoded client for the Stripe REST endpoints the app calls.
pub struct StripeClient<'a> {
    http: &'a reqwest::Client,
    config: &'a StripeConfig,
}

#[derive(Debug, Deserialize)]
pub struct CreatedCustomer {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedPortalSession {
    pub url: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Parameters for a subscription checkout.
pub struct CheckoutParams<'p> {
    pub customer_id: &'p str,
    pub price_id: &'p str,
    pub user_id: Uuid,
    /// Project unlocked by this purchase, if any.
    pub project_id: Option<i32>,
}

impl<'a> StripeClient<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a StripeConfig) -> Self {
        Self { http, config }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, BillingError> {
        let url = format!("{}{}", self.config.api_base.trim_end_matches('/'), path);
        debug!(%url, "Calling Stripe");

        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&text)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(text);
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    #[instrument(skip(self, email))]
    pub async fn create_customer(
        &self,
        user_id: Uuid,
        email: Option<&str>,
    ) -> Result<CreatedCustomer, BillingError> {
        let mut form = vec![("metadata[user_id]".to_string(), user_id.to_string())];
        if let Some(email) = email {
            form.push(("email".into(), email.to_string()));
        }
        self.post_form("/v1/customers", &form).await
    }

    #[instrument(skip(self, params), fields(user_id = %params.user_id, price_id = params.price_id))]
    pub async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> Result<CreatedCheckoutSession, BillingError> {
        let user_id = params.user_id.to_string();
        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("customer".into(), params.customer_id.to_string()),
            ("client_reference_id".into(), user_id.clone()),
            ("line_items[0][price]".into(), params.price_id.to_string()),
            ("line_items[0][quantity]".into(), "1".into()),
            ("success_url".into(), self.config.success_url.clone()),
            ("cancel_url".into(), self.config.cancel_url.clone()),
            ("metadata[user_id]".into(), user_id.clone()),
            ("metadata[price_id]".into(), params.price_id.to_string()),
            ("subscription_data[metadata][user_id]".into(), user_id),
        ];
        if let Some(project_id) = params.project_id {
            form.push(("metadata[project_id]".into(), project_id.to_string()));
        }
        self.post_form("/v1/checkout/sessions", &form).await
    }

    #[instrument(skip(self))]
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
    ) -> Result<CreatedPortalSession, BillingError> {
        let form = vec![
            ("customer".to_string(), customer_id.to_string()),
            (
                "return_url".to_string(),
                self.config.portal_return_url.clone(),
            ),
        ];
        self.post_form("/v1/billing_portal/sessions", &form).await
    }
}
