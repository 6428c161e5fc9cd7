//! Text generation gateway
//!
//! The single capability the pipeline stages consume:
//! `generate(stage, prompt, max_tokens) -> text`. Wraps any `LlmClient`
//! with a per-call timeout and a hard token cap, and treats an empty or
//! token-truncated answer as an invalid response so callers only ever see
//! complete text or an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{CompletionRequest, LlmClient, LlmError, Message, OfflineClient, StopReason};
use crate::config::LlmConfig;
use crate::prompts::Stage;

#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
    max_tokens: u32,
}

impl Gateway {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration, max_tokens: u32) -> Self {
        debug!(client = %client.name(), ?timeout, %max_tokens, "Gateway::new: called");
        Self {
            client,
            timeout,
            max_tokens,
        }
    }

    /// Build the gateway the configuration asks for
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = super::create_client(config)?;
        Ok(Self::new(client, Duration::from_millis(config.timeout_ms), config.max_tokens))
    }

    /// Gateway backed by the deterministic offline stand-in
    pub fn offline() -> Self {
        let defaults = LlmConfig::default();
        Self::new(
            Arc::new(OfflineClient::new()),
            Duration::from_millis(defaults.timeout_ms),
            defaults.max_tokens,
        )
    }

    /// Name of the backing client
    pub fn backend(&self) -> &str {
        self.client.name()
    }

    /// Issue one generation request for `stage`
    pub async fn generate(&self, stage: Stage, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        debug!(%stage, prompt_len = prompt.len(), %max_tokens, "Gateway::generate: called");
        let cap = max_tokens.min(self.max_tokens);
        let request = CompletionRequest {
            system_prompt: stage.system_prompt().to_string(),
            messages: vec![Message::user(prompt)],
            max_tokens: cap,
        };

        let response = match tokio::time::timeout(self.timeout, self.client.complete(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(%stage, timeout = ?self.timeout, "Gateway::generate: timed out");
                return Err(LlmError::Timeout(self.timeout));
            }
        };

        debug!(
            %stage,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Gateway::generate: usage"
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!(%stage, %cap, "Gateway::generate: answer cut off");
            return Err(LlmError::InvalidResponse(format!("answer truncated at {} tokens", cap)));
        }

        match response.content {
            Some(text) if !text.trim().is_empty() => {
                debug!(%stage, len = text.len(), "Gateway::generate: got text");
                Ok(text)
            }
            _ => {
                debug!(%stage, "Gateway::generate: empty response");
                Err(LlmError::InvalidResponse("empty response".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, TokenUsage};
    use crate::llm::client::mock::MockLlmClient;
    use async_trait::async_trait;

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CompletionResponse::text("too late"))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct TruncatingClient;

    #[async_trait]
    impl LlmClient for TruncatingClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: Some("Purpose===SECTION===Dear [NAME], I am wri".to_string()),
                stop_reason: StopReason::MaxTokens,
                usage: TokenUsage {
                    input_tokens: 40,
                    output_tokens: request.max_tokens as u64,
                },
            })
        }

        fn name(&self) -> &str {
            "truncating"
        }
    }

    #[tokio::test]
    async fn test_truncated_answer_is_invalid() {
        let gateway = Gateway::new(Arc::new(TruncatingClient), Duration::from_secs(1), 300);
        let err = gateway.generate(Stage::Draft, "draft please", 800).await.unwrap_err();
        match err {
            LlmError::InvalidResponse(msg) => assert_eq!(msg, "answer truncated at 300 tokens"),
            other => panic!("Expected InvalidResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_sets_stage_prompt_and_caps_tokens() {
        let mock = Arc::new(MockLlmClient::new(vec!["hello"]));
        let gateway = Gateway::new(mock.clone(), Duration::from_secs(1), 500);

        let text = gateway.generate(Stage::Draft, "draft please", 800).await.unwrap();
        assert_eq!(text, "hello");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt, Stage::Draft.system_prompt());
        assert_eq!(requests[0].max_tokens, 500);
        assert_eq!(requests[0].user_text(), Some("draft please"));
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let gateway = Gateway::new(Arc::new(SlowClient), Duration::from_millis(20), 100);
        let err = gateway.generate(Stage::Classify, "x", 100).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_empty_response_is_invalid() {
        let gateway = Gateway::new(Arc::new(MockLlmClient::new(vec!["   "])), Duration::from_secs(1), 100);
        let err = gateway.generate(Stage::Validate, "x", 100).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_client_errors_pass_through() {
        let gateway = Gateway::new(
            Arc::new(MockLlmClient::with_results(vec![Err("down")])),
            Duration::from_secs(1),
            100,
        );
        let err = gateway.generate(Stage::Validate, "x", 100).await.unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_offline_gateway() {
        let gateway = Gateway::offline();
        assert_eq!(gateway.backend(), "offline");
        let text = gateway.generate(Stage::Validate, "x", 250).await.unwrap();
        assert!(!text.trim_start().starts_with('{'));
    }
}
