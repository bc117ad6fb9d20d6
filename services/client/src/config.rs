//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_API_BASE_URL: &str = "https://apis.allsoft.co/api/documentManagement";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: Url,
    pub request_timeout: Duration,
    pub token_path: PathBuf,
    pub user_id: Option<String>,
    pub download_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Configuration pointing at `api_base_url` with every other setting at its default.
    pub fn new(api_base_url: Url, token_path: PathBuf) -> Self {
        Self {
            api_base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token_path,
            user_id: None,
            download_dir: PathBuf::from("."),
            log_level: Level::INFO,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Service Endpoint ---
        let base_url_str = std::env::var("DOCMAN_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&base_url_str).map_err(|e| {
            ConfigError::InvalidValue("DOCMAN_API_BASE_URL".to_string(), e.to_string())
        })?;

        let request_timeout = match std::env::var("DOCMAN_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        // --- Local Storage ---
        let token_path = match std::env::var("DOCMAN_TOKEN_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => dirs::data_dir()
                .map(|dir| dir.join("document-manager").join("session.json"))
                .ok_or_else(|| ConfigError::MissingVar("DOCMAN_TOKEN_PATH".to_string()))?,
        };

        let download_dir = std::env::var("DOCMAN_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let user_id = std::env::var("DOCMAN_USER_ID")
            .ok()
            .filter(|id| !id.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            request_timeout,
            token_path,
            user_id,
            download_dir,
            log_level,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || {
        ConfigError::InvalidValue(
            "DOCMAN_REQUEST_TIMEOUT_SECS".to_string(),
            format!("'{}' is not a positive number of seconds", raw),
        )
    };
    let secs = raw.trim().parse::<u64>().map_err(|_| invalid())?;
    if secs == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(secs))
}
