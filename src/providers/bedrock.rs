/*!
 * AWS Bedrock Runtime provider.
 *
 * Sends a single user message through the Converse API. Credentials come from
 * the default AWS chain (environment, shared profile, instance/task role),
 * optionally pinned to a named profile.
 */

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, SdkError};
use aws_sdk_bedrockruntime::operation::converse::ConverseError;
use aws_sdk_bedrockruntime::types::{ContentBlock, ConversationRole, InferenceConfiguration, Message};
use aws_sdk_bedrockruntime::Client;
use aws_smithy_types::{Document, Number};
use log::debug;

use crate::errors::ProviderError;
use crate::providers::{ModelRequest, ModelResponse, Provider};

/// Connection settings for the Bedrock runtime client.
#[derive(Debug, Clone, Default)]
pub struct BedrockSettings {
    /// AWS region hosting the model
    pub region: String,
    /// Endpoint override (VPC endpoint, local stub)
    pub endpoint: Option<String>,
    /// Named profile from the shared AWS config
    pub profile: Option<String>,
    /// Per-operation timeout
    pub timeout: Duration,
}

/// Bedrock Converse client
#[derive(Debug, Clone)]
pub struct Bedrock {
    client: Client,
}

impl Bedrock {
    /// Wrap an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential chain.
    pub async fn connect(settings: &BedrockSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(settings.timeout)
                    .build(),
            );
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;
        debug!("Bedrock client configured for region {}", settings.region);
        Self::new(Client::new(&config))
    }
}

/// `thinking` block for models that support extended reasoning.
fn thinking_fields(budget_tokens: u32) -> Document {
    let thinking = HashMap::from([
        ("type".to_string(), Document::String("enabled".to_string())),
        (
            "budget_tokens".to_string(),
            Document::Number(Number::PosInt(u64::from(budget_tokens))),
        ),
    ]);
    Document::Object(HashMap::from([("thinking".to_string(), Document::Object(thinking))]))
}

/// Concatenate the text blocks of a reply; reasoning blocks are dropped.
fn collect_text(blocks: &[ContentBlock]) -> Option<String> {
    let texts: Vec<&str> = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

fn map_sdk_error<R>(error: SdkError<ConverseError, R>) -> ProviderError
where
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&error).to_string();
    match &error {
        SdkError::ServiceError(service) => match service.err() {
            ConverseError::ThrottlingException(_) => ProviderError::RateLimitExceeded(message),
            ConverseError::AccessDeniedException(_) => ProviderError::AuthenticationError(message),
            ConverseError::ValidationException(_) => ProviderError::ApiError {
                status_code: 400,
                message,
            },
            _ => ProviderError::RequestFailed(message),
        },
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ProviderError::ConnectionError(message),
        SdkError::ResponseError(_) => ProviderError::ParseError(message),
        _ => ProviderError::RequestFailed(message),
    }
}

#[async_trait]
impl Provider for Bedrock {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(request.prompt.clone()))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build message: {}", e)))?;

        let (max_tokens, temperature, top_p) = request.effective_sampling();
        let inference = InferenceConfiguration::builder()
            .max_tokens(i32::try_from(max_tokens).unwrap_or(i32::MAX))
            .set_temperature(temperature)
            .set_top_p(top_p)
            .build();

        let mut call = self
            .client
            .converse()
            .model_id(&request.model_id)
            .messages(message)
            .inference_config(inference);
        if let Some(budget) = request.reasoning_budget {
            call = call.additional_model_request_fields(thinking_fields(budget));
        }

        let response = call.send().await.map_err(map_sdk_error)?;

        let output = response
            .output()
            .ok_or_else(|| ProviderError::ParseError("No output in response".to_string()))?;
        let message = output
            .as_message()
            .map_err(|_| ProviderError::ParseError("Output is not a message".to_string()))?;
        let text = collect_text(message.content()).ok_or(ProviderError::EmptyResponse)?;

        let (input_tokens, output_tokens) = match response.usage() {
            Some(usage) => (
                Some(usage.input_tokens().max(0) as u64),
                Some(usage.output_tokens().max(0) as u64),
            ),
            None => (None, None),
        };

        Ok(ModelResponse {
            text,
            input_tokens,
            output_tokens,
        })
    }

    fn name(&self) -> &str {
        "bedrock"
    }
}
