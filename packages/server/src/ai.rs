//! Marketing copy and logo generation through the OpenAI API.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequestArgs,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::OpenAiConfig;
use crate::error::AppError;

/// Kind of copy to write for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Description,
    Tagline,
    Tweet,
}

const SYSTEM_PROMPT: &str = "You write concise, upbeat marketing copy for newly launched crypto \
tokens. Never promise returns or give financial advice. Reply with the copy only.";

pub fn text_prompt(kind: TextKind, name: &str, ticker: &str, context: Option<&str>) -> String {
    let task = match kind {
        TextKind::Description => "Write a two-paragraph project description (max 120 words)",
        TextKind::Tagline => "Write a single tagline of at most 12 words",
        TextKind::Tweet => "Write a launch tweet under 260 characters with at most two hashtags",
    };
    let mut prompt = format!("{task} for the token {name} (${ticker}).");
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\nProject notes: ");
        prompt.push_str(context);
    }
    prompt
}

pub fn logo_prompt(name: &str, ticker: &str, style: Option<&str>) -> String {
    let style = style
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("flat vector, bold colors");
    format!(
        "Circular crypto token logo for {name} ({ticker}). Style: {style}. \
Centered emblem on a plain background, no text, no watermark."
    )
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

pub struct ContentGenerator<'a> {
    config: &'a OpenAiConfig,
    http: &'a reqwest::Client,
}

impl<'a> ContentGenerator<'a> {
    pub fn new(config: &'a OpenAiConfig, http: &'a reqwest::Client) -> Self {
        Self { config, http }
    }

    fn client(&self) -> Client<OpenAIConfig> {
        Client::with_config(
            OpenAIConfig::new()
                .with_api_key(self.config.api_key.clone())
                .with_api_base(self.config.api_base.clone()),
        )
    }

    #[instrument(skip(self, prompt))]
    pub async fn generate_text(&self, kind: TextKind, prompt: &str) -> Result<String, AppError> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Text(
                prompt.to_string(),
            ))
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.config.text_model.clone())
            .messages(vec![
                ChatCompletionRequestMessage::System(system),
                ChatCompletionRequestMessage::User(user),
            ])
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let response = self
            .client()
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::Upstream(format!("OpenAI chat completion failed: {e}")))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Upstream("OpenAI returned no text".into()))?;

        info!(?kind, chars = text.chars().count(), "Generated copy");
        Ok(text)
    }

    /// Generate a logo and return its URL (or a `data:` URL when the API
    /// answers with base64).
    #[instrument(skip(self, prompt))]
    pub async fn generate_logo(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!(
            "{}/images/generations",
            self.config.api_base.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&ImageRequest {
                model: &self.config.image_model,
                prompt,
                n: 1,
                size: &self.config.image_size,
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "OpenAI image generation returned {status}: {body}"
            )));
        }

        let parsed: ImageResponse = res.json().await?;
        let image = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("OpenAI returned no image".into()))?;
        match (image.url, image.b64_json) {
            (Some(url), _) => Ok(url),
            (None, Some(b64)) => Ok(format!("data:image/png;base64,{b64}")),
            (None, None) => Err(AppError::Upstream("OpenAI image has no payload".into())),
        }
    }
}
