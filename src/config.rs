//! Env-driven configuration.
//!
//! Values come from the process environment. The binary calls
//! [`Config::dotenv_load`] first so a `.env` file in the working directory
//! is honoured too.

use crate::error::{EditVizError, Result};
use crate::image::{GeminiModel, DEFAULT_MAX_UPLOAD_BYTES};
use std::time::Duration;

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: [&str; 3] = ["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Default Gemini API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential sent with every request.
    pub api_key: String,
    /// Model used for edits.
    pub model: GeminiModel,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Upload size limit; `None` means unlimited.
    pub max_upload_bytes: Option<u64>,
    /// Request timeout; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Loads `.env` into the process environment if present.
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|key| get(*key))
            .ok_or_else(|| {
                EditVizError::Auth(format!(
                    "no API key provided; set one of {}",
                    API_KEY_VARS.join(", ")
                ))
            })?;

        let model = match get("EDITVIZ_MODEL") {
            Some(value) => value.parse()?,
            None => GeminiModel::default(),
        };

        let base_url = get("EDITVIZ_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = match get("EDITVIZ_MAX_UPLOAD_BYTES") {
            Some(value) => match parse_number("EDITVIZ_MAX_UPLOAD_BYTES", &value)? {
                0 => None,
                n => Some(n),
            },
            None => Some(DEFAULT_MAX_UPLOAD_BYTES),
        };

        let request_timeout = match get("EDITVIZ_TIMEOUT_SECS") {
            Some(value) => match parse_number("EDITVIZ_TIMEOUT_SECS", &value)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => None,
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            max_upload_bytes,
            request_timeout,
        })
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| EditVizError::Config(format!("{key} must be a whole number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("API_KEY", "secret")]).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, GeminiModel::NanoBanana);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_upload_bytes, Some(DEFAULT_MAX_UPLOAD_BYTES));
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_missing_key() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, EditVizError::Auth(_)));

        let err = config_from(&[("API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, EditVizError::Auth(_)));
    }

    #[test]
    fn test_key_precedence() {
        let config =
            config_from(&[("GOOGLE_API_KEY", "google"), ("GEMINI_API_KEY", "gemini")]).unwrap();
        assert_eq!(config.api_key, "gemini");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("API_KEY", "k"),
            ("EDITVIZ_MODEL", "nano-banana-pro"),
            ("EDITVIZ_BASE_URL", "http://localhost:8080/"),
            ("EDITVIZ_MAX_UPLOAD_BYTES", "0"),
            ("EDITVIZ_TIMEOUT_SECS", "90"),
        ])
        .unwrap();
        assert_eq!(config.model, GeminiModel::NanoBananaPro);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_upload_bytes, None);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("API_KEY", "k"), ("EDITVIZ_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, EditVizError::Config(_)));

        let err = config_from(&[("API_KEY", "k"), ("EDITVIZ_MODEL", "dall-e")]).unwrap_err();
        assert!(matches!(err, EditVizError::Config(_)));
    }
}
