//! Runtime configuration read from `.env` and the process environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use thiserror::Error;

use crate::api_connection::endpoints::{DEFAULT_MODEL, OPENROUTER_BASE_URL};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TEMPERATURE_STEP: f32 = 0.1;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not found in environment: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },
}

/// Connection settings for the chat-completions provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Sent as `HTTP-Referer`.
    pub site_url: String,
    /// Sent as `X-Title`.
    pub app_name: String,
    /// Transport-level bound on a single chat-completion call.
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            site_url: "http://localhost:3000".to_string(),
            app_name: "SmartRecipes".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads the API key from `api_key_env_var` and the optional overrides:
    /// `SMART_RECIPES_MODEL`, `SMART_RECIPES_BASE_URL`,
    /// `SMART_RECIPES_TIMEOUT_SECS`, `SITE_URL`, `APP_NAME`.
    pub fn from_env(api_key_env_var: &str) -> Result<Self, ConfigError> {
        dotenv().ok();
        let api_key = env::var(api_key_env_var)
            .map_err(|_| ConfigError::MissingEnvVar(api_key_env_var.to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = env::var("SMART_RECIPES_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = env::var("SMART_RECIPES_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(site_url) = env::var("SITE_URL") {
            config.site_url = site_url;
        }
        if let Ok(app_name) = env::var("APP_NAME") {
            config.app_name = app_name;
        }
        config.timeout = Duration::from_secs(parse_var(
            "SMART_RECIPES_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        Ok(config)
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Retry and sampling policy for the recipe generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Retries after the first attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    pub base_temperature: f32,
    pub temperature_step: f32,
    /// Unit of the exponential backoff after a transport failure.
    pub backoff_base: Duration,
    pub max_tokens: Option<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_temperature: DEFAULT_BASE_TEMPERATURE,
            temperature_step: DEFAULT_TEMPERATURE_STEP,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_MS),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Ok(Self {
            max_retries: parse_var("SMART_RECIPES_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            base_temperature: parse_var("SMART_RECIPES_BASE_TEMPERATURE", DEFAULT_BASE_TEMPERATURE)?,
            temperature_step: parse_var("SMART_RECIPES_TEMPERATURE_STEP", DEFAULT_TEMPERATURE_STEP)?,
            backoff_base: Duration::from_millis(parse_var(
                "SMART_RECIPES_BACKOFF_MS",
                DEFAULT_BACKOFF_MS,
            )?),
            max_tokens: Some(parse_var("SMART_RECIPES_MAX_TOKENS", DEFAULT_MAX_TOKENS)?),
        })
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Sampling temperature for the zero-based `attempt`, rounded to two decimals.
    pub fn temperature_for(&self, attempt: u32) -> f32 {
        let raw = self.base_temperature + attempt as f32 * self.temperature_step;
        (raw * 100.0).round() / 100.0
    }

    /// Delay after a transport failure on the zero-based `attempt`: 2^attempt units.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
