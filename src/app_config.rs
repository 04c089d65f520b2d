use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::translation::{RetryPolicy, TranslationOptions};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language identifier, passed to the model as is
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language identifier, passed to the model as is
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Object storage config
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: AWS Bedrock Runtime (Converse API)
    #[default]
    Bedrock,
    // @provider: Anthropic Messages API
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Bedrock => "Bedrock",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Bedrock => "bedrock".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Translation backend and model parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    // @field: Backend
    #[serde(default)]
    pub provider: TranslationProvider,

    // @field: AWS region of the model (Bedrock)
    #[serde(default = "default_region")]
    pub region: String,

    // @field: Model identifier
    #[serde(default = "default_model_id")]
    pub model_id: String,

    // @field: Service URL override
    #[serde(default)]
    pub endpoint: Option<String>,

    // @field: API key (Anthropic)
    #[serde(default)]
    pub api_key: Option<String>,

    // @field: Named AWS profile (Bedrock)
    #[serde(default)]
    pub credentials_profile: Option<String>,

    // @field: Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: Max tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    // @field: Nucleus sampling mass
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    // @field: Extended reasoning mode
    #[serde(default)]
    pub use_reasoning: bool,

    // @field: Reasoning token budget
    #[serde(default = "default_reasoning_budget_tokens")]
    pub reasoning_budget_tokens: u32,

    // @field: Attempts per unit, first call included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    // @field: First retry wait; doubles per further failure
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Timeout seconds per call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Object storage backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    // @backend: Amazon S3 or an S3-compatible service
    #[default]
    S3,
    // @backend: Local directory tree (bucket = sub-directory)
    Local,
}

/// Object storage settings for jobs
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    // @field: Backend
    #[serde(default)]
    pub backend: StorageBackend,

    // @field: AWS region of the buckets
    #[serde(default = "default_region")]
    pub region: String,

    // @field: S3-compatible endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,

    // @field: Bucket for results; defaults to the input bucket
    #[serde(default)]
    pub output_bucket: Option<String>,

    // @field: Key prefix for results
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    // @field: Root directory of the local backend
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            region: default_region(),
            endpoint: None,
            output_bucket: None,
            output_prefix: default_output_prefix(),
            local_root: default_local_root(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "auto (en-US)".to_string()
}

fn default_target_language() -> String {
    "zh-TW".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_model_id() -> String {
    "anthropic.claude-3-5-sonnet-20241022-v2:0".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_top_p() -> f32 {
    0.9
}

fn default_reasoning_budget_tokens() -> u32 {
    2000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_output_prefix() -> String {
    "translated/".to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from(".")
}

fn validate_endpoint(name: &str, endpoint: &Option<String>) -> Result<()> {
    if let Some(endpoint) = endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        Url::parse(endpoint).map_err(|e| anyhow!("Invalid {} endpoint '{}': {}", name, endpoint, e))?;
    }
    Ok(())
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Languages are opaque to the pipeline; they only need to be present
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language must not be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language must not be empty"));
        }

        let translation = &self.translation;
        if translation.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&translation.temperature) {
            return Err(anyhow!("temperature must be between 0 and 1, got {}", translation.temperature));
        }
        if !(translation.top_p > 0.0 && translation.top_p <= 1.0) {
            return Err(anyhow!("top_p must be in (0, 1], got {}", translation.top_p));
        }
        if translation.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }
        if translation.model_id.trim().is_empty() {
            return Err(anyhow!("model_id must not be empty"));
        }

        // Validate API key for providers that need one
        if translation.provider == TranslationProvider::Anthropic
            && translation.api_key.as_deref().is_none_or(str::is_empty)
        {
            return Err(anyhow!("Translation API key is required for Anthropic provider"));
        }

        validate_endpoint("translation", &translation.endpoint)?;
        validate_endpoint("storage", &self.storage.endpoint)?;

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            storage: StorageConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Model parameters for translation calls
    pub fn options(&self) -> TranslationOptions {
        TranslationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            use_reasoning: self.use_reasoning,
            reasoning_budget_tokens: self.reasoning_budget_tokens,
        }
    }

    /// Attempt budget and backoff schedule
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            region: default_region(),
            model_id: default_model_id(),
            endpoint: None,
            api_key: None,
            credentials_profile: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            use_reasoning: false,
            reasoning_budget_tokens: default_reasoning_budget_tokens(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
