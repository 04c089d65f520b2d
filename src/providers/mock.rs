/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::echo()` - Returns the text it was asked to translate
 * - `MockProvider::fixed()` - Always answers with the same text
 * - `MockProvider::scripted()` - Answers from a per-call script
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::fail_first()` - Fails a number of calls, then echoes
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{ModelRequest, ModelResponse, Provider};
use crate::translation::prompts;

/// Behavior mode for the mock provider
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Returns the source text embedded in the prompt unchanged
    Echo,
    /// Always returns the same reply
    Fixed(String),
    /// Pops replies in order; errors once the script is exhausted
    Script(Arc<Mutex<VecDeque<Result<String, String>>>>),
    /// Always fails with an error
    Failing,
    /// Fails the first `failures` calls, then echoes
    FailFirst { failures: usize },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of calls received, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Prompts received, shared between clones
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider that echoes its input
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a mock provider that always returns `reply`
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fixed(reply.into()))
    }

    /// Create a mock provider that answers from a script of replies and failures
    pub fn scripted<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self::new(MockBehavior::Script(Arc::new(Mutex::new(replies.into_iter().collect()))))
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that fails `failures` times before echoing
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order
    pub fn received_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());

        let echo = || prompts::source_text(&request.prompt).unwrap_or(&request.prompt).to_string();

        let text = match &self.behavior {
            MockBehavior::Echo => echo(),
            MockBehavior::Fixed(reply) => reply.clone(),
            MockBehavior::Script(script) => match script.lock().pop_front() {
                Some(Ok(reply)) => reply,
                Some(Err(message)) => {
                    return Err(ProviderError::ApiError {
                        status_code: 500,
                        message,
                    })
                }
                None => return Err(ProviderError::RequestFailed("Mock script exhausted".to_string())),
            },
            MockBehavior::Failing => {
                return Err(ProviderError::RateLimitExceeded(format!(
                    "Simulated throttling (request #{})",
                    count + 1
                )))
            }
            MockBehavior::FailFirst { failures } => {
                if count < *failures {
                    return Err(ProviderError::ApiError {
                        message: format!("Simulated transient failure (request #{})", count + 1),
                        status_code: 503,
                    });
                }
                echo()
            }
        };

        Ok(ModelResponse {
            input_tokens: Some(request.prompt.len() as u64),
            output_tokens: Some(text.len() as u64),
            text,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
