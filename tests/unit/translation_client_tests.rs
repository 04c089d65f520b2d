/*!
 * Tests for the translation client: retry bound, blank input and prompts
 */

use std::sync::Arc;
use std::time::Duration;

use deck_translator::errors::{ProviderError, TranslationError};
use deck_translator::providers::mock::MockProvider;
use deck_translator::translation::prompts;
use deck_translator::translation::{RetryPolicy, TranslationClient, TranslationOptions, TranslationUnit};
use crate::common;

#[tokio::test]
async fn test_translate_withFixedReply_shouldReturnReply() {
    common::init_logging();
    let (provider, client) = common::mock_client(MockProvider::fixed("Bonjour"));

    let text = client
        .translate("Hello", "en", "fr", &TranslationOptions::default())
        .await
        .unwrap();

    assert_eq!(text, "Bonjour");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_translate_withAlwaysFailingProvider_shouldCallExactlyThreeTimes() {
    common::init_logging();
    let (provider, client) = common::mock_client(MockProvider::failing());

    let unit = TranslationUnit::new("Hello", "en", "fr", TranslationOptions::default());
    let err = client.translate_unit(&unit).await.unwrap_err();

    assert_eq!(provider.call_count(), 3);
    match err {
        TranslationError::Service { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, ProviderError::RateLimitExceeded(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_translate_withTransientFailures_shouldSucceedOnLastAttempt() {
    let (provider, client) = common::mock_client(MockProvider::fail_first(2));

    let unit = TranslationUnit::new("Hello", "en", "fr", TranslationOptions::default());
    let translation = client.translate_unit(&unit).await.unwrap();

    assert_eq!(translation.text, "Hello");
    assert_eq!(translation.attempts, 3);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_translate_withBlankText_shouldNotCallProvider() {
    let (provider, client) = common::mock_client(MockProvider::fixed("should not be used"));

    for text in ["", "   ", "\n\t"] {
        let translated = client
            .translate(text, "en", "fr", &TranslationOptions::default())
            .await
            .unwrap();
        assert_eq!(translated, "");
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_translate_withEmptyLanguage_shouldRejectWithoutCall() {
    let (provider, client) = common::mock_client(MockProvider::echo());

    let result = client.translate("Hello", "en", " ", &TranslationOptions::default()).await;

    assert!(matches!(result, Err(TranslationError::InvalidRequest(_))));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_translate_withReasoning_shouldUseReasoningPrompt() {
    let (provider, client) = common::mock_client(MockProvider::echo());
    let options = TranslationOptions {
        use_reasoning: true,
        ..TranslationOptions::default()
    };

    let text = client.translate("Churn rate", "en", "de", &options).await.unwrap();

    assert_eq!(text, "Churn rate");
    let prompt = &provider.received_prompts()[0];
    assert!(prompt.contains("First, analyze key terms and style"));
    assert!(prompt.contains("from en to de"));
    assert_eq!(prompts::source_text(prompt), Some("Churn rate"));
}

#[tokio::test]
async fn test_translate_batch_shouldKeepOrderAndSkipBlanks() {
    let (provider, client) = common::mock_client(MockProvider::scripted(vec![
        Ok("Un".to_string()),
        Err("boom".to_string()),
        Err("boom".to_string()),
        Err("boom".to_string()),
        Ok("Trois".to_string()),
    ]));
    let texts = vec!["One".to_string(), "".to_string(), "Two".to_string(), "Three".to_string()];

    let results = client.translate_batch(&texts, "en", "fr", &TranslationOptions::default()).await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_deref().ok(), Some("Un"));
    assert_eq!(results[1].as_deref().ok(), Some(""));
    assert!(matches!(results[2], Err(TranslationError::Service { attempts: 3, .. })));
    assert_eq!(results[3].as_deref().ok(), Some("Trois"));
    assert_eq!(provider.call_count(), 5);
}

#[tokio::test]
async fn test_connection_withFailingProvider_shouldReportError() {
    let (provider, client) = common::mock_client(MockProvider::failing());
    assert!(client.test_connection("en", "fr").await.is_err());
    // No retries for the connection check
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withDefaultPolicy_shouldWaitOneThenTwoSeconds() {
    let provider = Arc::new(MockProvider::failing());
    let client = TranslationClient::new(provider.clone(), "mock-model", RetryPolicy::default());
    let start = tokio::time::Instant::now();

    let unit = TranslationUnit::new("Hello", "en", "fr", TranslationOptions::default());
    let err = client.translate_unit(&unit).await.unwrap_err();

    assert!(matches!(err, TranslationError::Service { attempts: 3, .. }));
    assert_eq!(provider.call_count(), 3);
    // No wait after the final attempt
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "waited {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(4), "waited {:?}", elapsed);
}
