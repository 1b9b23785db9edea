use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;

/// Deployment environment, drives log formatting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Application configuration, read from `DD_*` environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Browser origin allowed by CORS
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Directory holding the saved progress
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Without a key every assistant call fails over to the local fallbacks
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_quiz_length")]
    pub quiz_length: usize,
    /// Offset of the user's calendar from UTC, for streak days
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sessions unseen this long are dropped
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_session_sweep_secs")]
    pub session_sweep_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("DD_UTC_OFFSET_MINUTES out of range: {0}")]
    UtcOffset(i32),
    #[error("DD_QUIZ_LENGTH must be at least 1")]
    QuizLength,
    #[error("DD_SESSION_SWEEP_SECS must be at least 1")]
    SessionSweep,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build from explicit `DD_*` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed("DD_").from_iter(vars)?;
        config.utc_offset()?;
        if config.quiz_length == 0 {
            return Err(ConfigError::QuizLength);
        }
        if config.session_sweep_secs == 0 {
            return Err(ConfigError::SessionSweep);
        }
        Ok(config)
    }

    /// The user's calendar
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::UtcOffset(self.utc_offset_minutes))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_quiz_length() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

fn default_session_sweep_secs() -> u64 {
    5 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.quiz_length, 5);
        assert_eq!(config.session_ttl(), Duration::from_secs(1800));
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(300));
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.utc_offset().unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_vars(vars(&[
            ("DD_ENV", "production"),
            ("DD_GEMINI_API_KEY", "k"),
            ("DD_UTC_OFFSET_MINUTES", "-300"),
            ("DD_QUIZ_LENGTH", "8"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.env, Environment::Production);
        assert_eq!(config.gemini_api_key.as_deref(), Some("k"));
        assert_eq!(config.quiz_length, 8);
        assert_eq!(
            config.utc_offset().unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ApiConfig::from_vars(vars(&[("DD_UTC_OFFSET_MINUTES", "100000")])),
            Err(ConfigError::UtcOffset(100000))
        ));
        assert!(matches!(
            ApiConfig::from_vars(vars(&[("DD_QUIZ_LENGTH", "0")])),
            Err(ConfigError::QuizLength)
        ));
        assert!(matches!(
            ApiConfig::from_vars(vars(&[("DD_SESSION_SWEEP_SECS", "0")])),
            Err(ConfigError::SessionSweep)
        ));
        assert!(ApiConfig::from_vars(vars(&[("DD_ENV", "staging")])).is_err());
    }
}
