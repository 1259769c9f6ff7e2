use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

/// Claims of a user access token issued by the auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // Profile ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize, // Expiration timestamp
}

/// Sign a token the way the auth provider does. Used by operators and tests
/// to mint tokens for a known user id.
pub fn sign(user_id: Uuid, email: Option<&str>, config: &AuthConfig) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(1))
        .ok_or_else(|| anyhow::anyhow!("expiration overflow"))?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        email: email.map(str::to_owned),
        aud: config.audience.clone(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a user token.
pub fn verify(token: &str, config: &AuthConfig) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.set_audience(&[config.audience.as_str()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
