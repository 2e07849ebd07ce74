//! Configuration loading, validation, and management for TickerLens.
//!
//! Loads configuration from `~/.tickerlens/config.toml` with environment
//! variable overrides. Budget and retry settings live here instead of in
//! process-wide constants so the assembler and invoker can be built with
//! per-test values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.tickerlens/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model endpoint API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Bundle size budget
    #[serde(default)]
    pub bundle: BundleConfig,

    /// Model invocation settings
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("bundle", &self.bundle)
            .field("llm", &self.llm)
            .finish()
    }
}

/// Size budget for the assembled bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Soft cap on bundle tokens.
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Fixed characters-per-token ratio used to turn the token cap into a
    /// character cap.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

fn default_max_context_tokens() -> usize {
    80_000
}
fn default_chars_per_token() -> usize {
    4
}

impl BundleConfig {
    /// A budget of `max_context_tokens` at the default ratio.
    pub fn with_tokens(max_context_tokens: usize) -> Self {
        Self {
            max_context_tokens,
            chars_per_token: default_chars_per_token(),
        }
    }

    /// The global character budget.
    pub fn max_chars(&self) -> usize {
        self.max_context_tokens.saturating_mul(self.chars_per_token)
    }

    /// Approximate token count for a character length.
    pub fn approx_tokens(&self, chars: usize) -> usize {
        chars / self.chars_per_token.max(1)
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

/// Model endpoint and retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per model reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Total attempts per invocation, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base; attempt `n` waits `base * 2^(n-1)` seconds.
    #[serde(default = "default_retry_base_secs")]
    pub retry_base_secs: f64,

    /// Override the endpoint (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_base_secs() -> f64 {
    1.0
}
fn default_request_timeout_secs() -> u64 {
    300
}

impl LlmConfig {
    /// Backoff delay after a retryable fault on `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        Duration::from_secs_f64(self.retry_base_secs.max(0.0) * 2f64.powi(exponent))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_attempts: default_max_attempts(),
            retry_base_secs: default_retry_base_secs(),
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tickerlens/config.toml).
    ///
    /// Environment variables override the file:
    /// - `TICKERLENS_API_KEY` (highest priority), then `ANTHROPIC_API_KEY`
    /// - `TICKERLENS_MODEL`
    /// - `TICKERLENS_CONTEXT_TOKENS`
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

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("TICKERLENS_API_KEY").or_else(|| non_empty("ANTHROPIC_API_KEY")) {
            self.api_key = Some(key);
        }

        if let Some(model) = non_empty("TICKERLENS_MODEL") {
            self.llm.model = model;
        }

        if let Some(raw) = non_empty("TICKERLENS_CONTEXT_TOKENS") {
            self.bundle.max_context_tokens = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "TICKERLENS_CONTEXT_TOKENS must be a positive integer, got {raw:?}"
                ))
            })?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tickerlens")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bundle.max_context_tokens == 0 || self.bundle.chars_per_token == 0 {
            return Err(ConfigError::ValidationError(
                "bundle.max_context_tokens and bundle.chars_per_token must be > 0".into(),
            ));
        }

        if self.llm.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_attempts must be at least 1".into(),
            ));
        }

        if !self.llm.retry_base_secs.is_finite() || self.llm.retry_base_secs < 0.0 {
            return Err(ConfigError::ValidationError(
                "llm.retry_base_secs must be a non-negative number".into(),
            ));
        }

        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        Ok(())
    }

    /// The API key, or an error naming where to set it.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Generate a default config TOML string (for `config init`).
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

    #[error("No API key configured: set ANTHROPIC_API_KEY or api_key in the config file")]
    MissingApiKey,
}
