//! Google Gemini client for the `generateContent` endpoint

use async_trait::async_trait;
use indogen_core::{CompletionClient, ServiceError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::classify_status;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Client for the Gemini `v1beta` text generation API
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response from `generateContent`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiClient {
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

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
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
            .json::<GenerateResponse>()
            .await
            .map_err(|e| ServiceError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        extract_text(&body)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Classify a failed call from its status and error body.
///
/// `RESOURCE_EXHAUSTED` marks quota exhaustion whatever the HTTP status.
pub fn error_from_body(status: StatusCode, body: &str) -> ServiceError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_err) => {
            let exhausted = api_err.error.status.as_deref() == Some("RESOURCE_EXHAUSTED");
            classify_status(status, api_err.error.message, exhausted)
        }
        Err(_) => classify_status(status, body.to_string(), false),
    }
}

/// Concatenate the text parts of the first candidate
pub fn extract_text(response: &GenerateResponse) -> Result<String, ServiceError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(ServiceError::MalformedResponse(format!(
            "Prompt blocked by provider: {reason}"
        )));
    }

    let Some(candidate) = response.candidates.first() else {
        return Err(ServiceError::MalformedResponse(
            "No candidates in response".to_string(),
        ));
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(ServiceError::MalformedResponse(format!(
            "No text content in response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_exhausted_is_quota() {
        let body = r#"{"error": {"code": 403, "message": "Quota exceeded for quota metric 'Generate Content API requests per minute'", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = error_from_body(StatusCode::FORBIDDEN, body);
        assert_eq!(
            err,
            ServiceError::QuotaExhausted {
                status: 403,
                message: "Quota exceeded for quota metric 'Generate Content API requests per minute'"
                    .to_string(),
            }
        );
    }

    #[test]
    fn test_other_api_error() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(
            error_from_body(StatusCode::BAD_REQUEST, body),
            ServiceError::Api {
                status: 400,
                message: "API key not valid.".to_string(),
            }
        );
    }

    #[test]
    fn test_non_json_error_body() {
        assert_eq!(
            error_from_body(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>"),
            ServiceError::Api {
                status: 502,
                message: "<html>Bad Gateway</html>".to_string(),
            }
        );
    }

    fn parse(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Laporan "}, {"text": "klinis"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 120}
        }));
        assert_eq!(extract_text(&response).unwrap(), "Laporan klinis");
    }

    #[test]
    fn test_blocked_prompt() {
        let response = parse(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        let err = extract_text(&response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_empty_candidate() {
        let response = parse(serde_json::json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }));
        let err = extract_text(&response).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));

        let response = parse(serde_json::json!({}));
        assert!(matches!(
            extract_text(&response),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("AIza-test".to_string());
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
        assert_eq!(client.model_id(), DEFAULT_MODEL);

        let client = client
            .with_model("gemini-2.5-pro")
            .with_api_base("http://127.0.0.1:9999/");
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9999/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }
}
