//! Claude API client for the Anthropic Messages API

use async_trait::async_trait;
use indogen_core::{CompletionClient, ServiceError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::classify_status;

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Client for the Anthropic Claude Messages API
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

/// A message in the conversation
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Request body for the Messages API
#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

/// Individual content block within a response
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Response from the Messages API
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Error detail from the Messages API
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl AnthropicClient {
    /// Create a new client with the given API key
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status, &body));
        }

        let body = response
            .json::<ApiResponse>()
            .await
            .map_err(|e| ServiceError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        tracing::debug!(stop_reason = ?body.stop_reason, "Claude completion received");
        extract_text(&body)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Classify a failed call from its status and error body
pub fn error_from_body(status: StatusCode, body: &str) -> ServiceError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_err) => classify_status(
            status,
            api_err.error.message,
            api_err.error.kind == "rate_limit_error",
        ),
        Err(_) => classify_status(status, body.to_string(), false),
    }
}

/// Concatenate the text blocks of a response
pub fn extract_text(response: &ApiResponse) -> Result<String, ServiceError> {
    let text: Vec<&str> = response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
        .collect();

    if text.is_empty() {
        return Err(ServiceError::MalformedResponse(
            "No text content in response".to_string(),
        ));
    }
    Ok(text.join(""))
}
