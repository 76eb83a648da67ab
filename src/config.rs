// src/config.rs
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),
    #[error("{name} must be a boolean, got {value:?}")]
    InvalidFlag { name: &'static str, value: String },
    #[error("UPSTREAM_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidTimeout(String),
}

/// Process configuration, read once at startup.
///
/// The API key never leaves its [`SecretString`] except when the Gemini
/// client builds a request header.
#[derive(Debug)]
pub struct Config {
    pub api_key: SecretString,
    pub port: u16,
    pub model: String,
    pub api_base: String,
    pub history_enabled: bool,
    pub static_dir: String,
    pub upstream_timeout: Option<Duration>,
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let history_enabled = match get("CHAT_HISTORY") {
            Some(raw) => parse_flag("CHAT_HISTORY", raw)?,
            None => true,
        };

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => None,
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            port,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: get("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            history_enabled,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            upstream_timeout,
        })
    }
}

fn parse_flag(name: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(cfg.api_key.expose_secret(), "k");
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert!(cfg.history_enabled);
        assert_eq!(cfg.static_dir, "public");
        assert!(cfg.upstream_timeout.is_none());
    }

    #[test]
    fn overrides_apply() {
        let cfg = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("PORT", "8080"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("GEMINI_API_BASE", "http://localhost:9000/"),
            ("CHAT_HISTORY", "off"),
            ("UPSTREAM_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.model, "gemini-pro");
        assert_eq!(cfg.api_base, "http://localhost:9000");
        assert!(!cfg.history_enabled);
        assert_eq!(cfg.upstream_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("CHAT_HISTORY", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFlag { name: "CHAT_HISTORY", .. }));

        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("UPSTREAM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
