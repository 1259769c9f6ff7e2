use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ai::TextKind;
use crate::error::AppError;

use super::shared::{validate_optional_text, validate_text};

#[derive(Deserialize, ToSchema)]
pub struct GenerateTextRequest {
    pub kind: TextKind,
    #[schema(example = "Crafted Coin")]
    pub name: String,
    #[schema(example = "CRAFT")]
    pub ticker: String,
    /// Free-form notes about the project.
    pub context: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateTextResponse {
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateLogoRequest {
    pub name: String,
    pub ticker: String,
    /// Visual style hint, e.g. "pixel art".
    pub style: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateLogoResponse {
    pub url: String,
}

pub fn validate_text_request(req: &GenerateTextRequest) -> Result<(), AppError> {
    validate_text(&req.name, "Name", 64)?;
    validate_text(&req.ticker, "Ticker", 10)?;
    validate_optional_text(req.context.as_deref(), "Context", 1000)
}

pub fn validate_logo_request(req: &GenerateLogoRequest) -> Result<(), AppError> {
    validate_text(&req.name, "Name", 64)?;
    validate_text(&req.ticker, "Ticker", 10)?;
    validate_optional_text(req.style.as_deref(), "Style", 200)
}
