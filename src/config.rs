//! Configuration management for the `wanderlist` application
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::WanderlistError;
use crate::orchestrator::RunMode;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// City used when neither the request nor the configuration names one
pub const FALLBACK_CITY: &str = "北京";

/// Root configuration structure for the `wanderlist` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WanderlistConfig {
    /// Maps, geocoding and weather service settings
    pub search: SearchConfig,
    /// LLM chat completion settings
    pub narrative: NarrativeConfig,
    /// Default application settings
    pub defaults: DefaultsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Force offline operation even when credentials are present
    pub mock_mode: bool,
}

/// Maps web service settings, shared by place search and weather lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Web service key
    pub api_key: Option<String>,
    /// Base URL of the web service
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

/// Chat completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Bearer token for the completion endpoint
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Persona prompt sent as the system message
    pub system_prompt: String,
    /// Ask the provider to augment answers with web search
    pub enable_search: bool,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// City searched when the query does not name one
    pub city: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_search_base_url() -> String {
    "https://restapi.amap.com".to_string()
}

fn default_search_timeout() -> u64 {
    8_000
}

fn default_narrative_base_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

fn default_narrative_model() -> String {
    "qwen-plus".to_string()
}

fn default_system_prompt() -> String {
    "你是一位熟悉各地旅游和本地生活的出行顾问，擅长根据用户需求、天气和候选地点给出简洁、实用的推荐。"
        .to_string()
}

fn default_narrative_timeout() -> u64 {
    60_000
}

fn default_city() -> String {
    FALLBACK_CITY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_search_base_url(),
            timeout_ms: default_search_timeout(),
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_narrative_base_url(),
            model: default_narrative_model(),
            system_prompt: default_system_prompt(),
            enable_search: false,
            timeout_ms: default_narrative_timeout(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl NarrativeConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl WanderlistConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WANDERLIST_SEARCH__API_KEY, WANDERLIST_MOCK_MODE, ...
        builder = builder.add_source(
            Environment::with_prefix("WANDERLIST")
                .prefix_separator("_")
                .separator("__"),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WanderlistConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wanderlist").join("config.toml"))
    }

    /// Apply default values to blank configuration fields
    pub fn apply_defaults(&mut self) {
        if self.search.base_url.is_empty() {
            self.search.base_url = default_search_base_url();
        }
        if self.search.timeout_ms == 0 {
            self.search.timeout_ms = default_search_timeout();
        }
        if self.narrative.base_url.is_empty() {
            self.narrative.base_url = default_narrative_base_url();
        }
        if self.narrative.model.is_empty() {
            self.narrative.model = default_narrative_model();
        }
        if self.narrative.system_prompt.trim().is_empty() {
            self.narrative.system_prompt = default_system_prompt();
        }
        if self.narrative.timeout_ms == 0 {
            self.narrative.timeout_ms = default_narrative_timeout();
        }
        if self.defaults.city.trim().is_empty() {
            self.defaults.city = default_city();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        // Blank keys count as absent
        if self.search.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.search.api_key = None;
        }
        if self.narrative.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.narrative.api_key = None;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Names of the credentials that are not configured
    #[must_use]
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.search.api_key.is_none() {
            missing.push("search.api_key");
        }
        if self.narrative.api_key.is_none() {
            missing.push("narrative.api_key");
        }
        missing
    }

    /// Fail with a configuration error listing every missing credential
    pub fn require_keys(&self) -> crate::Result<()> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WanderlistError::config(format!(
                "missing credentials: {}",
                missing.join(", ")
            )))
        }
    }

    /// Offline unless at least one credential is present and mock mode is off
    #[must_use]
    pub fn run_mode(&self) -> RunMode {
        if self.mock_mode || (self.search.api_key.is_none() && self.narrative.api_key.is_none())
        {
            RunMode::Mock
        } else {
            RunMode::Live
        }
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.search.timeout_ms > 120_000 {
            return Err(
                WanderlistError::config("Search timeout cannot exceed 120000 ms").into(),
            );
        }

        if self.narrative.timeout_ms > 600_000 {
            return Err(
                WanderlistError::config("Narrative timeout cannot exceed 600000 ms").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WanderlistError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WanderlistError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Search", &self.search.base_url),
            ("Narrative", &self.narrative.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WanderlistError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
