//! Completion backends behind [`indogen_core::CompletionClient`]

pub mod anthropic;
pub mod gemini;

use std::sync::Arc;

use indogen_core::{CompletionClient, ConfigError, ServiceError};
use reqwest::StatusCode;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;

use crate::config::{Config, Provider};

/// Build the client for the configured provider.
///
/// Fails with [`ConfigError::MissingCredential`] when the provider's key is
/// absent; the dashboard then runs with analysis disabled.
pub fn client_from_config(config: &Config) -> Result<Arc<dyn CompletionClient>, ConfigError> {
    let api_key = config.credential()?.to_string();

    let client: Arc<dyn CompletionClient> = match config.provider {
        Provider::Gemini => {
            let mut client = GeminiClient::new(api_key);
            if let Some(model) = &config.model {
                client = client.with_model(model.clone());
            }
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base.clone());
            }
            Arc::new(client)
        }
        Provider::Anthropic => {
            let mut client = AnthropicClient::new(api_key);
            if let Some(model) = &config.model {
                client = client.with_model(model.clone());
            }
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base.clone());
            }
            Arc::new(client)
        }
    };

    Ok(client)
}

/// Map a non-success HTTP status onto the service error taxonomy
pub(crate) fn classify_status(status: StatusCode, message: String, exhausted: bool) -> ServiceError {
    if exhausted || status == StatusCode::TOO_MANY_REQUESTS {
        ServiceError::QuotaExhausted {
            status: status.as_u16(),
            message,
        }
    } else {
        ServiceError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into(), false),
            ServiceError::QuotaExhausted { status: 429, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "quota".into(), true),
            ServiceError::QuotaExhausted { status: 403, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "bad".into(), false),
            ServiceError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_client_from_config() {
        let config = Config::from_lookup(|key| match key {
            "COMPLETION_PROVIDER" => Some("anthropic".to_string()),
            "ANTHROPIC_API_KEY" => Some("sk-ant-test".to_string()),
            "COMPLETION_MODEL" => Some("claude-haiku-4-5".to_string()),
            _ => None,
        })
        .unwrap();
        let client = client_from_config(&config).unwrap();
        assert_eq!(client.model_id(), "claude-haiku-4-5");

        let config = Config::from_lookup(|_| None).unwrap();
        assert!(matches!(
            client_from_config(&config),
            Err(ConfigError::MissingCredential(_))
        ));
    }
}
