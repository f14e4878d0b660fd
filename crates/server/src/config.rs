//! Server configuration

use std::path::PathBuf;

use indogen_core::ConfigError;

/// Completion backend selected by `COMPLETION_PROVIDER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
}

impl Provider {
    /// Environment variable holding this provider's API key
    pub fn credential_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub patient_data_path: PathBuf,
    pub provider: Provider,
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub rate_limit_rps: u32,
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get("COMPLETION_PROVIDER").as_deref().map(str::trim) {
            None => Provider::Gemini,
            Some(p) if p.eq_ignore_ascii_case("gemini") => Provider::Gemini,
            Some(p) if p.eq_ignore_ascii_case("anthropic") => Provider::Anthropic,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "COMPLETION_PROVIDER".to_string(),
                    reason: format!("unknown provider '{other}' (expected gemini or anthropic)"),
                });
            }
        };

        let rate_limit_rps = match get("ANALYSIS_RATE_LIMIT_RPS") {
            None => 5,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(rps) if rps > 0 => rps,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ANALYSIS_RATE_LIMIT_RPS".to_string(),
                        reason: format!("expected a positive integer, got '{raw}'"),
                    });
                }
            },
        };

        Ok(Self {
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            patient_data_path: get("PATIENT_DATA_PATH")
                .unwrap_or_else(|| "data/data_genetik.json".into())
                .into(),
            provider,
            gemini_api_key: get("GEMINI_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            model: get("COMPLETION_MODEL"),
            api_base: get("COMPLETION_API_BASE"),
            rate_limit_rps,
        })
    }

    /// API key for the selected provider
    pub fn credential(&self) -> Result<&str, ConfigError> {
        let key = match self.provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
        };
        key.ok_or_else(|| ConfigError::MissingCredential(self.provider.credential_var().to_string()))
    }
}
