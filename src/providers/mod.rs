/*!
 * Provider implementations for text-generation backends.
 *
 * This module contains client implementations for the supported backends:
 * - Bedrock: AWS Bedrock Runtime Converse API
 * - Anthropic: Anthropic Messages API over HTTP
 * - Mock: scripted in-process provider for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod anthropic;
pub mod bedrock;
pub mod mock;

/// One model call: a single user prompt plus sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Complete user prompt
    pub prompt: String,

    /// Model identifier understood by the backend
    pub model_id: String,

    /// Maximum number of tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling mass
    pub top_p: f32,

    /// Extended reasoning budget in tokens; `None` disables reasoning
    pub reasoning_budget: Option<u32>,
}

impl ModelRequest {
    /// Sampling parameters as sent to a backend that supports extended reasoning.
    ///
    /// Reasoning requires temperature 1.0 and no nucleus sampling override, and
    /// the output budget must exceed the reasoning budget.
    pub fn effective_sampling(&self) -> (u32, Option<f32>, Option<f32>) {
        match self.reasoning_budget {
            Some(budget) => (budget.saturating_add(self.max_tokens), Some(1.0), None),
            None => (self.max_tokens, Some(self.temperature), Some(self.top_p)),
        }
    }
}

/// Text returned by a model call plus token accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    /// Concatenated text content (reasoning content excluded)
    pub text: String,

    /// Prompt tokens consumed, when reported
    pub input_tokens: Option<u64>,

    /// Completion tokens generated, when reported
    pub output_tokens: Option<u64>,
}

/// Common trait for all text-generation providers
///
/// Implementations perform exactly one outbound call per `complete`; retrying
/// is the caller's responsibility.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send one request and return the generated text.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}
