use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AI_PROVIDER: &str = "databricks";

/// Host/token pair used for the optional auto-connect step at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutoConnect {
    pub host: String,
    pub token: String,
}

/// Provider/model pair used for the optional AI auto-configure step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDefaults {
    pub provider: String,
    pub model: String,
}

/// Execution-environment configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub auto_connect: Option<AutoConnect>,
    pub ai_defaults: Option<AiDefaults>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            auto_connect: None,
            ai_defaults: None,
        }
    }
}

impl AppConfig {
    /// Reads process environment variables, loading a `.env` file first if
    /// one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Environment-independent core of `from_env`, driven by any lookup
    /// function. Missing or malformed values fall back to defaults; the
    /// auto-connect pair is all-or-nothing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("PAPERLENS_API_URL")
            .map(|value| value.trim_end_matches('/').to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let request_timeout_secs = lookup("PAPERLENS_TIMEOUT_SECS")
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let host = lookup("DATABRICKS_HOST").filter(|value| !value.trim().is_empty());
        let token = lookup("DATABRICKS_TOKEN").filter(|value| !value.trim().is_empty());
        let auto_connect = match (host, token) {
            (Some(host), Some(token)) => Some(AutoConnect { host, token }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("incomplete DATABRICKS_HOST/DATABRICKS_TOKEN pair; auto-connect disabled");
                None
            }
            (None, None) => None,
        };

        let ai_defaults = lookup("PAPERLENS_AI_MODEL")
            .filter(|value| !value.trim().is_empty())
            .map(|model| AiDefaults {
                provider: lookup("PAPERLENS_AI_PROVIDER")
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_AI_PROVIDER.to_owned()),
                model,
            });

        Self {
            api_base_url,
            request_timeout_secs,
            auto_connect,
            ai_defaults,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(|value| (*value).to_owned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn base_url_is_normalized_without_trailing_slash() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("PAPERLENS_API_URL", "http://api:9000/")]));
        assert_eq!(config.api_base_url, "http://api:9000");
    }

    #[test]
    fn auto_connect_requires_both_host_and_token() {
        let partial = AppConfig::from_lookup(lookup_from(&[(
            "DATABRICKS_HOST",
            "https://dbc.example.com",
        )]));
        assert!(partial.auto_connect.is_none());

        let complete = AppConfig::from_lookup(lookup_from(&[
            ("DATABRICKS_HOST", "https://dbc.example.com"),
            ("DATABRICKS_TOKEN", "dapi123"),
        ]));
        let auto = complete.auto_connect.expect("auto connect");
        assert_eq!(auto.host, "https://dbc.example.com");
        assert_eq!(auto.token, "dapi123");
    }

    #[test]
    fn ai_defaults_need_a_model_and_default_the_provider() {
        let none = AppConfig::from_lookup(lookup_from(&[("PAPERLENS_AI_PROVIDER", "openai")]));
        assert!(none.ai_defaults.is_none());

        let defaults = AppConfig::from_lookup(lookup_from(&[(
            "PAPERLENS_AI_MODEL",
            "databricks-meta-llama-3-3-70b-instruct",
        )]));
        let ai = defaults.ai_defaults.expect("ai defaults");
        assert_eq!(ai.provider, DEFAULT_AI_PROVIDER);
        assert_eq!(ai.model, "databricks-meta-llama-3-3-70b-instruct");
    }

    #[test]
    fn malformed_timeout_falls_back_to_default() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("PAPERLENS_TIMEOUT_SECS", "not-a-number")]));
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
