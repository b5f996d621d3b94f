//! OpenAI API Provider
//!
//! Uses the Responses API: a single `instructions` field carries the system
//! instruction, separate from `input`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, join_url, send_json};
use super::{GenerationRequest, LlmProvider, ProviderConfig};
use crate::types::{ErrorCategory, LlmError, Result, RunesmithError};

const PROVIDER: &str = "openai";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const API_KEY_VAR: &str = "OPENAI_API_KEY";
const API_BASE_VAR: &str = "OPENAI_API_BASE";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.key_or_env(API_KEY_VAR).ok_or_else(|| {
            RunesmithError::missing_capability(
                PROVIDER,
                format!("an API key (set {} or providers.openai.api_key)", API_KEY_VAR),
            )
        })?;

        let api_base = config
            .base_or_env(API_BASE_VAR)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            client: build_client(config.timeout_secs, PROVIDER)?,
        })
    }

    fn build_request(request: &GenerationRequest) -> ResponsesRequest {
        ResponsesRequest {
            model: request.model.clone(),
            instructions: request.system_instruction.clone(),
            input: request.user_prompt.clone(),
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(
            "Generating with OpenAI (model: {}, temperature: {})",
            request.model, request.temperature
        );

        let url = join_url(&self.api_base, "responses");
        debug!("Sending request to OpenAI API");

        let body: ResponsesResponse = send_json(
            self.client
                .post(&url)
                .bearer_auth(self.api_key.expose_secret())
                .json(&Self::build_request(request)),
            PROVIDER,
        )
        .await?;

        body.into_text().ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                "No content in OpenAI response",
                PROVIDER,
            )
            .into()
        })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    instructions: String,
    input: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    /// Convenience aggregate, present on some API versions
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    fn into_text(self) -> Option<String> {
        if let Some(text) = self.output_text.filter(|t| !t.is_empty()) {
            return Some(text);
        }
        let text: String = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|c| c.content_type == "output_text")
            .filter_map(|c| c.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            api_key: Some("sk-test".to_string()),
            api_base: Some(server.uri()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_responses_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4.1",
                "instructions": "be brief",
                "input": "# File: a.py\nprint(1)",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": [
                    {"type": "reasoning", "content": []},
                    {"type": "message", "content": [
                        {"type": "output_text", "text": "Summary."}
                    ]}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
        let request = GenerationRequest::new("gpt-4.1", "be brief", "# File: a.py\nprint(1)");
        let text = provider.generate(&request).await.unwrap();
        assert_eq!(text, "Summary.");
    }

    #[tokio::test]
    async fn test_rate_limit_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
        let err = provider
            .generate(&GenerationRequest::new("gpt-4.1", "s", "u"))
            .await
            .unwrap_err();
        match err {
            RunesmithError::Backend(e) => {
                assert_eq!(e.category, ErrorCategory::RateLimit);
                assert_eq!(e.retry_after, Some(std::time::Duration::from_secs(7)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_output_text_preferred() {
        let body: ResponsesResponse =
            serde_json::from_value(json!({"output_text": "direct", "output": []})).unwrap();
        assert_eq!(body.into_text().as_deref(), Some("direct"));
    }
}
