//! Configuration file parser for ~/.config/pulse-account/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. Environment variables override file values.
use crate::util::{validate_base_url, UrlValidationError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Env var naming the backend base URL (read at build time and at runtime).
pub const BASE_URL_ENV: &str = "PULSE_API_BASE_URL";
/// Env var naming the account to operate on (read at build time and at runtime).
pub const ACCOUNT_ID_ENV: &str = "PULSE_ACCOUNT_ID";

const FALLBACK_BASE_URL: &str = "http://localhost:4000";
const FALLBACK_ACCOUNT_ID: &str = "acct-maya-lumen";

/// Base URL baked in at build time, else the local development backend.
pub fn default_base_url() -> &'static str {
    option_env!("PULSE_API_BASE_URL").unwrap_or(FALLBACK_BASE_URL)
}

/// Account id baked in at build time, else the seeded demo account.
pub fn default_account_id() -> &'static str {
    option_env!("PULSE_ACCOUNT_ID").unwrap_or(FALLBACK_ACCOUNT_ID)
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid api_base_url: {0}")]
    InvalidBaseUrl(#[from] UrlValidationError),

    #[error("account_id must not be empty")]
    EmptyAccountId,
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Client configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL, without the `/api/...` suffix.
    pub api_base_url: String,

    /// Account the client hydrates and mutates.
    pub account_id: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url().to_string(),
            account_id: default_account_id().to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 3] = ["api_base_url", "account_id", "request_timeout_secs"];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), base_url = %config.api_base_url, "Loaded configuration");
        Ok(config)
    }

    /// Applies `PULSE_API_BASE_URL` / `PULSE_ACCOUNT_ID` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup (the environment in production).
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(base_url = %url, "Base URL overridden by environment");
            self.api_base_url = url;
        }
        if let Some(id) = lookup(ACCOUNT_ID_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(account_id = %id, "Account id overridden by environment");
            self.account_id = id;
        }
        self
    }

    /// Checks the values a transport and store need.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.api_base_url)?;
        if self.account_id.trim().is_empty() {
            return Err(ConfigError::EmptyAccountId);
        }
        Ok(())
    }

    /// Request timeout, never shorter than one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================
