//! Configuration loading, validation, and management for ghdocs.
//!
//! Loads configuration from `~/.ghdocs/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hard ceiling on parallel fetches, whatever the config says.
pub const MAX_CONCURRENCY: usize = 32;

/// The root configuration structure.
///
/// Maps directly to `~/.ghdocs/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Repository host settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Fetch stage settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Classification and selection settings
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL (change for GitHub Enterprise)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Raw content base URL
    #[serde(default = "default_raw_url")]
    pub raw_url: String,

    /// Access token for private repositories and higher rate limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}
fn default_raw_url() -> String {
    "https://raw.githubusercontent.com".into()
}
fn default_user_agent() -> String {
    format!("ghdocs/{}", env!("CARGO_PKG_VERSION"))
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            raw_url: default_raw_url(),
            token: None,
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("raw_url", &self.raw_url)
            .field("token", &redact(&self.token))
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum fetches in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Additional attempts after a transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles on every retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on any single backoff, including retry-after hints
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Overall deadline for the fetch stage (unset = none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,

    /// Cap on the number of documents fetched (unset = no cap)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_documents: Option<usize>,
}

fn default_concurrency() -> usize {
    8
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_max_backoff_secs() -> u64 {
    60
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            deadline_secs: None,
            max_documents: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Extra case-insensitive substrings excluded on top of the built-ins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_exclusions: Vec<String>,

    /// Fetch `Additional` documents even when they don't match the context
    #[serde(default)]
    pub include_additional: bool,
}

impl AppConfig {
    /// Load configuration from the default path (~/.ghdocs/config.toml).
    ///
    /// Also checks environment variables:
    /// - `GHDOCS_GITHUB_TOKEN` (highest priority), `GITHUB_TOKEN`, `GH_TOKEN`
    /// - `GHDOCS_API_URL`
    /// - `GHDOCS_CONCURRENCY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let token = lookup("GHDOCS_GITHUB_TOKEN")
            .or_else(|| lookup("GITHUB_TOKEN"))
            .or_else(|| lookup("GH_TOKEN"))
            .filter(|t| !t.trim().is_empty());
        if token.is_some() {
            self.github.token = token;
        }

        if let Some(url) = lookup("GHDOCS_API_URL") {
            self.github.api_url = url;
        }

        if let Some(raw) = lookup("GHDOCS_CONCURRENCY") {
            self.fetch.concurrency = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "GHDOCS_CONCURRENCY must be a positive integer, got '{raw}'"
                ))
            })?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ghdocs")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.concurrency == 0 || self.fetch.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::ValidationError(format!(
                "fetch.concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }

        if self.fetch.backoff_base_ms == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.backoff_base_ms must be > 0".into(),
            ));
        }

        if self.fetch.max_documents == Some(0) {
            return Err(ConfigError::ValidationError(
                "fetch.max_documents must be > 0 when set".into(),
            ));
        }

        if self.github.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "github.request_timeout_secs must be > 0".into(),
            ));
        }

        for (field, url) in [("api_url", &self.github.api_url), ("raw_url", &self.github.raw_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "github.{field} must start with http:// or https://"
                )));
            }
        }

        Ok(())
    }

    /// Check if a GitHub token is available (from config or environment).
    pub fn has_token(&self) -> bool {
        self.github.token.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for ghdocs_core::Error {
    fn from(e: ConfigError) -> Self {
        ghdocs_core::Error::Config {
            message: e.to_string(),
        }
    }
}
