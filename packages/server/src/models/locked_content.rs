use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::locked_content;
use crate::error::AppError;

use super::shared::{validate_optional_text, validate_text, validate_token_amount};

pub const CONTENT_TYPES: &[&str] = &["link", "video", "file", "text"];

#[derive(Deserialize, ToSchema)]
pub struct CreateLockedContentRequest {
    /// URL-safe identifier (3-64 chars of `a-z`, `0-9`, `-`). Generated from
    /// the title when omitted.
    #[schema(example = "holders-ama")]
    pub slug: Option<String>,
    #[schema(example = "Holders-only AMA recording")]
    pub title: String,
    pub description: Option<String>,
    /// One of: link, video, file, text.
    #[schema(example = "video")]
    pub content_type: String,
    pub content_url: String,
    /// Whole tokens the wallet must hold.
    #[schema(example = "1000")]
    pub min_balance: String,
}

/// Full item as seen by the project owner.
#[derive(Serialize, ToSchema)]
pub struct LockedContentResponse {
    pub id: i32,
    pub project_id: i32,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
    pub content_url: String,
    pub min_balance: String,
    pub created_at: DateTime<Utc>,
}

impl From<locked_content::Model> for LockedContentResponse {
    fn from(m: locked_content::Model) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            slug: m.slug,
            title: m.title,
            description: m.description,
            content_type: m.content_type,
            content_url: m.content_url,
            min_balance: m.min_balance,
            created_at: m.created_at,
        }
    }
}

/// Public view of an item; the content URL is only revealed through the
/// access endpoint.
#[derive(Serialize, ToSchema)]
pub struct LockedContentSummary {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub content_type: String,
    pub min_balance: String,
}

impl From<locked_content::Model> for LockedContentSummary {
    fn from(m: locked_content::Model) -> Self {
        Self {
            slug: m.slug,
            title: m.title,
            description: m.description,
            content_type: m.content_type,
            min_balance: m.min_balance,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AccessRequest {
    #[schema(example = "0x000000000000000000000000000000000000dEaD")]
    pub wallet_address: String,
    /// `personal_sign` signature of `TokenCrafter access: {slug}`.
    pub signature: String,
}

#[derive(Serialize, ToSchema)]
pub struct AccessResponse {
    pub slug: String,
    pub title: String,
    pub content_type: String,
    pub content_url: String,
}

pub fn is_valid_slug(slug: &str) -> bool {
    (3..=64).contains(&slug.len())
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

/// Derive a slug from a title, with a random suffix to keep it unique.
pub fn slug_from_title(title: &str) -> String {
    let mut base = String::new();
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c.to_ascii_lowercase());
        } else if !base.ends_with('-') && !base.is_empty() {
            base.push('-');
        }
        if base.len() >= 48 {
            break;
        }
    }
    let base = base.trim_end_matches('-');
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    if base.is_empty() {
        format!("content-{suffix}")
    } else {
        format!("{base}-{suffix}")
    }
}

pub fn validate_create_locked_content(req: &CreateLockedContentRequest) -> Result<(), AppError> {
    if let Some(ref slug) = req.slug
        && !is_valid_slug(slug)
    {
        return Err(AppError::Validation(
            "Slug must be 3-64 characters of a-z, 0-9 and inner hyphens".into(),
        ));
    }
    validate_text(&req.title, "Title", 128)?;
    validate_optional_text(req.description.as_deref(), "Description", 2000)?;
    if !CONTENT_TYPES.contains(&req.content_type.as_str()) {
        return Err(AppError::Validation(format!(
            "Content type must be one of: {}",
            CONTENT_TYPES.join(", ")
        )));
    }
    validate_text(&req.content_url, "Content URL", 2048)?;
    validate_token_amount(&req.min_balance, "Minimum balance")
}
