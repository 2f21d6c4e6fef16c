//! Completion service configuration and credential resolution.

use docqa_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_AZURE_API_VERSION: &str = "2023-03-15-preview";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Completion provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Azure,
    OpenAI,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Azure => write!(f, "azure"),
            Provider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Resolved completion configuration. The API key is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub provider: Provider,
    /// Azure resource endpoint, or the OpenAI-compatible base URL.
    pub endpoint: String,
    #[serde(skip_serializing, default)]
    pub api_key: String,
    /// Model name; the deployment name on Azure.
    pub model: String,
    #[serde(default)]
    pub api_version: Option<String>,
    pub temperature: f64,
}

impl CompletionConfig {
    /// Load from environment variables, failing fast on missing credentials.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Auth(format!("missing environment variable {}", key)))
        };

        let provider = match lookup("DOCQA_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("azure") => Provider::Azure,
            Some("openai") => Provider::OpenAI,
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown provider '{}', expected 'azure' or 'openai'",
                    other
                )))
            }
        };

        let temperature = lookup("DOCQA_TEMPERATURE")
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let config = match provider {
            Provider::Azure => Self {
                provider,
                endpoint: require("AZURE_OPENAI_ENDPOINT")?,
                api_key: require("AZURE_OPENAI_API_KEY")?,
                model: require("AZURE_OPENAI_MODEL_DEPLOYMENT")?,
                api_version: Some(
                    lookup("AZURE_OPENAI_API_VERSION")
                        .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
                ),
                temperature,
            },
            Provider::OpenAI => Self {
                provider,
                endpoint: lookup("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                api_key: require("OPENAI_API_KEY")?,
                model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                api_version: None,
                temperature,
            },
        };

        info!(
            "Completion provider: {} (model {})",
            config.provider, config.model
        );
        Ok(config)
    }

    /// Chat completions URL for the configured provider.
    pub fn chat_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match self.provider {
            Provider::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base,
                self.model,
                self.api_version
                    .as_deref()
                    .unwrap_or(DEFAULT_AZURE_API_VERSION)
            ),
            Provider::OpenAI => format!("{}/chat/completions", base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_azure_from_vars() {
        let config = CompletionConfig::from_vars(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com/"),
            ("AZURE_OPENAI_API_KEY", "secret"),
            ("AZURE_OPENAI_MODEL_DEPLOYMENT", "gpt-4-deployment"),
        ]))
        .unwrap();

        assert_eq!(config.provider, Provider::Azure);
        assert_eq!(
            config.chat_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4-deployment/chat/completions?api-version=2023-03-15-preview"
        );
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let err = CompletionConfig::from_vars(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_MODEL_DEPLOYMENT", "gpt-4-deployment"),
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Auth(ref m) if m.contains("AZURE_OPENAI_API_KEY")));
    }

    #[test]
    fn test_openai_defaults() {
        let config = CompletionConfig::from_vars(lookup(&[
            ("DOCQA_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.chat_url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.model, DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = CompletionConfig::from_vars(lookup(&[
            ("DOCQA_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-test"));
    }
}
