/*!
 * Translation client: one external text-generation call with retry.
 *
 * The client builds the prompt, sends it through a `Provider`, and retries
 * failed calls with exponential backoff. It is the only retry boundary in the
 * pipeline; callers above it never retry.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use log::{debug, error, info};
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::anthropic::Anthropic;
use crate::providers::bedrock::{Bedrock, BedrockSettings};
use crate::providers::{ModelRequest, Provider};
use super::prompts;

/// Model parameters for a translation call
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOptions {
    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens in the reply
    pub max_tokens: u32,

    /// Nucleus sampling mass
    pub top_p: f32,

    /// Ask the model to analyze terms and style before translating
    pub use_reasoning: bool,

    /// Token budget for extended reasoning
    pub reasoning_budget_tokens: u32,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 3000,
            top_p: 0.9,
            use_reasoning: false,
            reasoning_budget_tokens: 2000,
        }
    }
}

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_attempts: u32,

    /// Wait after the first failed attempt; doubles after each further failure
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt count and no waiting, for tests and local stubs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: Duration::ZERO,
        }
    }

    /// Wait after failed attempt `attempt` (0-based): base, 2×base, 4×base, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(1u32 << attempt.min(16))
    }
}

/// One container's text on its way to the model
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    /// Original full text
    pub text: String,

    /// Source language identifier (opaque)
    pub source_language: String,

    /// Target language identifier (opaque)
    pub target_language: String,

    /// Model parameters
    pub options: TranslationOptions,
}

impl TranslationUnit {
    /// Create a new unit.
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        options: TranslationOptions,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            options,
        }
    }

    /// Reject units with empty language identifiers.
    pub fn validate(&self) -> Result<(), TranslationError> {
        if self.source_language.trim().is_empty() {
            return Err(TranslationError::InvalidRequest("source language is empty".to_string()));
        }
        if self.target_language.trim().is_empty() {
            return Err(TranslationError::InvalidRequest("target language is empty".to_string()));
        }
        Ok(())
    }

    /// Whether the unit has nothing to translate.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn to_model_request(&self, model_id: &str) -> ModelRequest {
        ModelRequest {
            prompt: prompts::build_prompt(
                &self.text,
                &self.source_language,
                &self.target_language,
                self.options.use_reasoning,
            ),
            model_id: model_id.to_string(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
            top_p: self.options.top_p,
            reasoning_budget: self
                .options
                .use_reasoning
                .then_some(self.options.reasoning_budget_tokens),
        }
    }
}

/// A successful translation plus call accounting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    /// Translated text as returned by the model
    pub text: String,

    /// Attempts used, including the successful one (0 for blank input)
    pub attempts: u32,

    /// Prompt tokens of the successful call
    pub input_tokens: Option<u64>,

    /// Completion tokens of the successful call
    pub output_tokens: Option<u64>,

    /// Wall time including backoff waits
    pub duration: Duration,
}

/// Client for translation calls; cheap to clone
#[derive(Debug, Clone)]
pub struct TranslationClient {
    /// Backend performing the calls
    provider: Arc<dyn Provider>,

    /// Model identifier sent with each call
    model_id: String,

    /// Retry behavior
    retry: RetryPolicy,
}

impl TranslationClient {
    /// Create a client around a provider.
    pub fn new(provider: Arc<dyn Provider>, model_id: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            retry,
        }
    }

    /// Build the provider described by the configuration.
    pub async fn from_config(config: &TranslationConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let endpoint = config.endpoint.as_deref().filter(|e| !e.trim().is_empty());
        if let Some(endpoint) = endpoint {
            Url::parse(endpoint).map_err(|e| anyhow!("Invalid endpoint '{}': {}", endpoint, e))?;
        }

        let provider: Arc<dyn Provider> = match config.provider {
            ConfigTranslationProvider::Bedrock => {
                let settings = BedrockSettings {
                    region: config.region.clone(),
                    endpoint: endpoint.map(str::to_string),
                    profile: config.credentials_profile.clone(),
                    timeout,
                };
                Arc::new(Bedrock::connect(&settings).await)
            }
            ConfigTranslationProvider::Anthropic => {
                let api_key = config
                    .api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| anyhow!("Anthropic provider requires an API key"))?;
                Arc::new(Anthropic::new(api_key, endpoint.unwrap_or_default(), timeout))
            }
        };

        Ok(Self::new(provider, config.model_id.clone(), config.retry_policy()))
    }

    /// Backend name for logs.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Model identifier.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Retry behavior.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Translate text, returning only the translated string.
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        options: &TranslationOptions,
    ) -> Result<String, TranslationError> {
        let unit = TranslationUnit::new(text, source_language, target_language, options.clone());
        Ok(self.translate_unit(&unit).await?.text)
    }

    /// Translate a unit with retry.
    ///
    /// Blank text returns an empty translation without calling the backend.
    /// After the last failed attempt the final cause is returned inside
    /// `TranslationError::Service`.
    pub async fn translate_unit(&self, unit: &TranslationUnit) -> Result<Translation, TranslationError> {
        unit.validate()?;
        if unit.is_blank() {
            return Ok(Translation::default());
        }

        let start_time = Instant::now();
        let request = unit.to_model_request(&self.model_id);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.provider.complete(&request).await {
                Ok(response) => {
                    debug!(
                        "{} response received in {:?} (attempt {}/{})",
                        self.provider.name(),
                        start_time.elapsed(),
                        attempt + 1,
                        max_attempts
                    );
                    return Ok(Translation {
                        text: response.text,
                        attempts: attempt + 1,
                        input_tokens: response.input_tokens,
                        output_tokens: response.output_tokens,
                        duration: start_time.elapsed(),
                    });
                }
                Err(e) => {
                    error!("Translation attempt {}/{} failed: {}", attempt + 1, max_attempts, e);
                    if attempt + 1 >= max_attempts {
                        return Err(TranslationError::Service {
                            attempts: max_attempts,
                            source: e,
                        });
                    }

                    let delay = self.retry.delay_after(attempt);
                    if !delay.is_zero() {
                        info!("Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Translate several texts one after another.
    ///
    /// Returns one result per input in order; blank inputs yield an empty
    /// string without a call, and a failure only affects its own entry.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
        options: &TranslationOptions,
    ) -> Vec<Result<String, TranslationError>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.translate(text, source_language, target_language, options).await);
        }
        results
    }

    /// Send a tiny request to check credentials and connectivity.
    pub async fn test_connection(&self, source_language: &str, target_language: &str) -> Result<(), ProviderError> {
        let unit = TranslationUnit::new(
            "Hello",
            source_language,
            target_language,
            TranslationOptions {
                max_tokens: 20,
                ..TranslationOptions::default()
            },
        );
        self.provider
            .complete(&unit.to_model_request(&self.model_id))
            .await
            .map(|_| ())
    }
}
