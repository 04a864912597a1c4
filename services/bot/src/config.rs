//! services/bot/src/config.rs
//!
//! Defines the bot's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use pdf_reader_core::actions::DEFAULT_CALLBACK_DATA_LIMIT;
use pdf_reader_core::paginator::DEFAULT_PAGE_SIZE;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub data_dir: PathBuf,
    /// Words per page.
    pub page_size: usize,
    /// Maximum callback token length accepted by the transport, in bytes.
    pub callback_data_limit: usize,
    /// Maximum button label length, in characters.
    pub button_label_limit: usize,
    pub max_upload_bytes: usize,
    /// When set, every request must carry this value in the `x-bot-secret` header.
    pub webhook_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: Level::INFO,
            data_dir: PathBuf::from("./data"),
            page_size: DEFAULT_PAGE_SIZE,
            callback_data_limit: DEFAULT_CALLBACK_DATA_LIMIT,
            button_label_limit: 21,
            max_upload_bytes: 20 * 1024 * 1024,
            webhook_secret: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_address = parse_or("BIND_ADDRESS", &lookup, defaults.bind_address)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let data_dir = lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir);

        let page_size = parse_or("PAGE_SIZE", &lookup, defaults.page_size)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "PAGE_SIZE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let callback_data_limit = parse_or("CALLBACK_DATA_LIMIT", &lookup, defaults.callback_data_limit)?;
        let button_label_limit = parse_or("BUTTON_LABEL_LIMIT", &lookup, defaults.button_label_limit)?;
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes)?;

        let webhook_secret = lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty());

        Ok(Self {
            bind_address,
            log_level,
            data_dir,
            page_size,
            callback_data_limit,
            button_label_limit,
            max_upload_bytes,
            webhook_secret,
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
