//! Anthropic Messages API Provider
//!
//! The system instruction goes in the top-level `system` field; the user
//! prompt is the single `user` message. `max_tokens` is mandatory here.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, join_url, send_json};
use super::{GenerationRequest, LlmProvider, ProviderConfig};
use crate::types::{ErrorCategory, LlmError, Result, RunesmithError};

const PROVIDER: &str = "anthropic";
const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.key_or_env(API_KEY_VAR).ok_or_else(|| {
            RunesmithError::missing_capability(
                PROVIDER,
                format!("an API key (set {} or providers.anthropic.api_key)", API_KEY_VAR),
            )
        })?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs, PROVIDER)?,
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            system: request.system_instruction.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.user_prompt.clone(),
            }],
            temperature: request.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(
            "Generating with Anthropic (model: {}, temperature: {})",
            request.model, request.temperature
        );

        let url = join_url(&self.api_base, "v1/messages");
        debug!("Sending request to Anthropic API");

        let body: MessagesResponse = send_json(
            self.client
                .post(&url)
                .header("x-api-key", self.api_key.expose_secret())
                .header("anthropic-version", API_VERSION)
                .json(&self.build_request(request)),
            PROVIDER,
        )
        .await?;

        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ParseError,
                "No text content in Anthropic response",
                PROVIDER,
            )
            .into());
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> AnthropicProvider {
        let config = ProviderConfig {
            api_key: Some("ant-key".to_string()),
            api_base: Some(server.uri()),
            max_tokens: 1024,
            ..Default::default()
        };
        AnthropicProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_messages_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "ant-key"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-3-opus",
                "system": "sys",
                "messages": [{"role": "user", "content": "hello"}],
                "max_tokens": 1024
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "text", "text": "Hello "},
                    {"type": "text", "text": "there"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider_for(&server)
            .generate(&GenerationRequest::new("claude-3-opus", "sys", "hello"))
            .await
            .unwrap();
        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn test_auth_failure_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate(&GenerationRequest::new("claude-3-opus", "s", "u"))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), "backend");
    }
}
