//! # Configuration
//!
//! Runtime settings, read once at startup. Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. An optional TOML file ([`Config::load`]).
//! 3. `ERP_*` environment variables.
//!
//! ```toml
//! data_mode = "api"
//!
//! [api]
//! base_url = "https://erp.example.com/api/v1"
//! timeout_ms = 15000
//!
//! [ui]
//! show_loading_indicators = true
//! min_loading_ms = 300
//! default_page_size = 50
//!
//! [mock]
//! mode = "with_data"
//! delay = true
//! delay_min_ms = 200
//! delay_max_ms = 600
//! ```

use crate::hooks::LoadingPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Which provider implementation backs the [`DataProvider`](crate::framework::DataProvider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// In-memory stores seeded with fixtures.
    #[default]
    Mock,
    /// The REST backend.
    Api,
}

impl FromStr for DataMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(DataMode::Mock),
            "api" => Ok(DataMode::Api),
            other => Err(other.to_string()),
        }
    }
}

/// Behavior of the in-memory adapter, for exercising each view state during development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockMode {
    #[default]
    WithData,
    Empty,
    Error,
    Loading,
}

impl FromStr for MockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "with_data" | "withdata" => Ok(MockMode::WithData),
            "empty" => Ok(MockMode::Empty),
            "error" => Ok(MockMode::Error),
            "loading" => Ok(MockMode::Loading),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_loading_indicators: bool,
    pub min_loading_ms: u64,
    pub default_page_size: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_loading_indicators: true,
            min_loading_ms: 300,
            default_page_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub mode: MockMode,
    /// Simulate network latency.
    pub delay: bool,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::WithData,
            delay: true,
            delay_min_ms: 200,
            delay_max_ms: 600,
        }
    }
}

impl MockConfig {
    /// Latency bounds, or `None` when the delay is disabled.
    pub fn delay_range(&self) -> Option<(Duration, Duration)> {
        self.delay.then(|| {
            (
                Duration::from_millis(self.delay_min_ms),
                Duration::from_millis(self.delay_max_ms),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_mode: DataMode,
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub mock: MockConfig,
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::default().with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file, then applies the environment on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_toml_str(&content)?.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError { source: e })
    }

    /// Applies `ERP_*` overrides from `lookup` (normally `std::env::var`).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("ERP_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("ERP_DATA_MODE") {
            self.data_mode = parse_value("ERP_DATA_MODE", &v)?;
        }
        if let Some(v) = lookup("ERP_API_TIMEOUT_MS") {
            self.api.timeout_ms = parse_value("ERP_API_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("ERP_SHOW_LOADING_INDICATORS") {
            self.ui.show_loading_indicators = parse_bool("ERP_SHOW_LOADING_INDICATORS", &v)?;
        }
        if let Some(v) = lookup("ERP_MIN_LOADING_MS") {
            self.ui.min_loading_ms = parse_value("ERP_MIN_LOADING_MS", &v)?;
        }
        if let Some(v) = lookup("ERP_DEFAULT_PAGE_SIZE") {
            self.ui.default_page_size = parse_value("ERP_DEFAULT_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("ERP_MOCK_MODE") {
            self.mock.mode = parse_value("ERP_MOCK_MODE", &v)?;
        }
        if let Some(v) = lookup("ERP_MOCK_DELAY") {
            self.mock.delay = parse_bool("ERP_MOCK_DELAY", &v)?;
        }
        if let Some(v) = lookup("ERP_MOCK_DELAY_MIN_MS") {
            self.mock.delay_min_ms = parse_value("ERP_MOCK_DELAY_MIN_MS", &v)?;
        }
        if let Some(v) = lookup("ERP_MOCK_DELAY_MAX_MS") {
            self.mock.delay_max_ms = parse_value("ERP_MOCK_DELAY_MAX_MS", &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_mode == DataMode::Api && self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "api.base_url is required in api mode".to_string(),
            });
        }
        if self.ui.default_page_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "ui.default_page_size must be greater than 0".to_string(),
            });
        }
        if self.mock.delay_min_ms > self.mock.delay_max_ms {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "mock.delay_min_ms ({}) is greater than mock.delay_max_ms ({})",
                    self.mock.delay_min_ms, self.mock.delay_max_ms
                ),
            });
        }
        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn loading_policy(&self) -> LoadingPolicy {
        LoadingPolicy {
            show_indicators: self.ui.show_loading_indicators,
            min_duration: Duration::from_millis(self.ui.min_loading_ms),
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
