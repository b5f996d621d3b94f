//! Ollama Local LLM Provider
//!
//! Talks to a locally running Ollama server through its OpenAI-compatible
//! chat endpoint. No credentials; the requested temperature is honored.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::chat::{self, ChatCompletionResponse};
use super::http::{build_client, join_url, send_json};
use super::{GenerationRequest, LlmProvider, ProviderConfig};
use crate::types::{ErrorCategory, LlmError, Result, RunesmithError};

const PROVIDER: &str = "ollama";
const DEFAULT_API_BASE: &str = "http://localhost:11434";

/// Ollama Local LLM Provider
#[derive(Debug)]
pub struct OllamaProvider {
    api_base: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Validate endpoint URL for security (SSRF prevention)
        let api_base = Self::validate_endpoint(&api_base)?;

        Ok(Self {
            api_base,
            client: build_client(config.timeout_secs, PROVIDER)?,
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            RunesmithError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RunesmithError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    /// Locally installed model tags, sorted
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = join_url(&self.api_base, "api/tags");
        let tags: OllamaTagsResponse = send_json(self.client.get(&url), PROVIDER)
            .await
            .map_err(|e| self.connection_hint(e))?;

        let mut names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        names.sort();
        Ok(names)
    }

    fn connection_hint(&self, err: RunesmithError) -> RunesmithError {
        match err {
            RunesmithError::Backend(e) if e.category == ErrorCategory::Network => {
                LlmError::with_provider(
                    ErrorCategory::Network,
                    format!(
                        "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve ({})",
                        self.api_base, e.message
                    ),
                    PROVIDER,
                )
                .into()
            }
            other => other,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(
            "Generating with Ollama (model: {}, temperature: {})",
            request.model, request.temperature
        );

        let url = join_url(&self.api_base, "v1/chat/completions");
        debug!("Sending request to Ollama API");

        let body: ChatCompletionResponse = send_json(
            self.client
                .post(&url)
                .json(&chat::build_request(request, true)),
            PROVIDER,
        )
        .await
        .map_err(|e| self.connection_hint(e))?;

        chat::extract_text(body, PROVIDER)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// Request/Response types

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_default_config() {
        let provider = OllamaProvider::new(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = ProviderConfig {
            api_base: Some("file:///etc/passwd".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            OllamaProvider::new(&config),
            Err(RunesmithError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_honors_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "llama3",
                "temperature": 0.5,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "local answer"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            api_base: Some(server.uri()),
            ..Default::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();
        let request = GenerationRequest::new("llama3", "sys", "hi").with_temperature(0.5);
        assert_eq!(provider.generate(&request).await.unwrap(), "local answer");
    }

    #[tokio::test]
    async fn test_list_models_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "qwen2:7b"}, {"name": "llama3:latest"}]
            })))
            .mount(&server)
            .await;

        let config = ProviderConfig {
            api_base: Some(server.uri()),
            ..Default::default()
        };
        let models = OllamaProvider::new(&config).unwrap().list_models().await.unwrap();
        assert_eq!(models, vec!["llama3:latest", "qwen2:7b"]);
    }
}
