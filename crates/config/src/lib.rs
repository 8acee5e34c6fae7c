//! Configuration loading, validation, and management for switchboard.
//!
//! Loads configuration from `~/.switchboard/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.switchboard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language model settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Memory (slot store + snippet index) settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Gateway HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Tool-specific settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base, e.g. "https://api.openai.com/v1"
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Composer temperature. The route classifier always runs at 0.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-attempt request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempt cap for the retry wrapper (1 = no retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// sqlx SQLite URL, e.g. "sqlite://switchboard.db" or "sqlite::memory:"
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Snippet embedding dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// How many per-user snippet indexes to keep resident (LRU beyond that)
    #[serde(default = "default_index_capacity")]
    pub index_capacity: usize,
}

fn default_database_url() -> String {
    "sqlite://switchboard.db".into()
}
fn default_embedding_dim() -> usize {
    384
}
fn default_index_capacity() -> usize {
    1024
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            embedding_dim: default_embedding_dim(),
            index_capacity: default_index_capacity(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for /chat. Unset = the gateway is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: usize,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}
fn default_rate_limit() -> usize {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_token: None,
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub stocks: StocksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
}

fn default_geocode_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".into()
}
fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".into()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocode_url: default_geocode_url(),
            forecast_url: default_forecast_url(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StocksConfig {
    /// "yahoo" (no credential) or "alphavantage" (needs an API key)
    #[serde(default = "default_stocks_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_vantage_api_key: Option<String>,
}

fn default_stocks_provider() -> String {
    "yahoo".into()
}

impl Default for StocksConfig {
    fn default() -> Self {
        Self {
            provider: default_stocks_provider(),
            alpha_vantage_api_key: None,
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

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_token", &redact(&self.auth_token))
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

impl std::fmt::Debug for StocksConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StocksConfig")
            .field("provider", &self.provider)
            .field(
                "alpha_vantage_api_key",
                &redact(&self.alpha_vantage_api_key),
            )
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.switchboard/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `SWITCHBOARD_API_KEY` / `OPENAI_API_KEY`: model API key
    /// - `SWITCHBOARD_MODEL`: model name
    /// - `SWITCHBOARD_DB`: sqlite URL
    /// - `API_AUTH_TOKEN`: gateway bearer token
    /// - `ALPHA_VANTAGE_API_KEY`, `STOCKS_PROVIDER`: stock tool
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var("SWITCHBOARD_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("SWITCHBOARD_MODEL") {
            config.llm.model = model;
        }

        if let Ok(url) = std::env::var("SWITCHBOARD_DB") {
            config.memory.database_url = url;
        }

        if config.gateway.auth_token.is_none() {
            config.gateway.auth_token = std::env::var("API_AUTH_TOKEN").ok();
        }

        if config.tools.stocks.alpha_vantage_api_key.is_none() {
            config.tools.stocks.alpha_vantage_api_key =
                std::env::var("ALPHA_VANTAGE_API_KEY").ok();
        }

        if let Ok(provider) = std::env::var("STOCKS_PROVIDER") {
            config.tools.stocks.provider = provider;
        }

        config.validate()?;
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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".switchboard")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.llm.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_retries must be at least 1".into(),
            ));
        }

        if self.memory.embedding_dim == 0 {
            return Err(ConfigError::ValidationError(
                "memory.embedding_dim must be > 0".into(),
            ));
        }

        if self.memory.index_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "memory.index_capacity must be > 0".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }

        if self.gateway.rate_limit_per_minute == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.rate_limit_per_minute must be > 0".into(),
            ));
        }

        match self.tools.stocks.provider.as_str() {
            "yahoo" | "alphavantage" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "tools.stocks.provider must be \"yahoo\" or \"alphavantage\", got \"{other}\""
                )));
            }
        }

        Ok(())
    }

    /// Check if a model API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.llm.api_key.is_some()
    }

    /// Generate a starter config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let body = toml::to_string_pretty(&Self::default()).unwrap_or_default();
        format!(
            "# Switchboard configuration. Every value below is a default; edit what you need.\n\
             # The model API key can live here as llm.api_key or in the environment as\n\
             # SWITCHBOARD_API_KEY / OPENAI_API_KEY. ALPHA_VANTAGE_API_KEY enables the\n\
             # alphavantage stocks provider.\n\n{body}"
        )
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.tools.stocks.provider, "yahoo");
        assert_eq!(config.memory.embedding_dim, 384);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.memory.index_capacity, config.memory.index_capacity);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.llm.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retries_rejected() {
        let mut config = AppConfig::default();
        config.llm.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_stocks_provider_rejected() {
        let mut config = AppConfig::default();
        config.tools.stocks.provider = "bloomberg".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bloomberg"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[llm]\nmodel = \"gpt-4o\"\n\n[gateway]\nauth_token = \"sekrit\"\nport = 9001"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.gateway.port, 9001);
        assert_eq!(config.gateway.auth_token.as_deref(), Some("sekrit"));
        // untouched sections keep defaults
        assert_eq!(config.memory.embedding_dim, 384);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-very-secret".into());
        config.gateway.auth_token = Some("tok".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(!debug.contains("\"tok\""));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.starts_with('#'));
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("open-meteo"));
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert!(parsed.validate().is_ok());
    }
}
