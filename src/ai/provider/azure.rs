//! Azure OpenAI Provider
//!
//! Chat Completions against a deployment named after the requested model.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::chat::{self, ChatCompletionResponse};
use super::http::{build_client, join_url, send_json};
use super::{GenerationRequest, LlmProvider, ProviderConfig};
use crate::constants::llm::DEFAULT_AZURE_API_VERSION;
use crate::types::{Result, RunesmithError};

const PROVIDER: &str = "azureopenai";
const API_KEY_VAR: &str = "AZURE_OPENAI_KEY";
const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";

pub struct AzureOpenAiProvider {
    api_key: SecretString,
    endpoint: String,
    api_version: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AzureOpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AzureOpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.key_or_env(API_KEY_VAR).ok_or_else(|| {
            RunesmithError::missing_capability(
                PROVIDER,
                format!("an API key (set {} or providers.azureopenai.api_key)", API_KEY_VAR),
            )
        })?;

        let endpoint = config.base_or_env(ENDPOINT_VAR).ok_or_else(|| {
            RunesmithError::missing_capability(
                PROVIDER,
                format!("an endpoint (set {} or providers.azureopenai.api_base)", ENDPOINT_VAR),
            )
        })?;

        let api_version = config
            .api_version
            .clone()
            .or_else(|| std::env::var(API_VERSION_VAR).ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            endpoint,
            api_version,
            client: build_client(config.timeout_secs, PROVIDER)?,
        })
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(
            "Generating with Azure OpenAI (deployment: {}, temperature: {})",
            request.model, request.temperature
        );

        let url = join_url(
            &self.endpoint,
            &format!("openai/deployments/{}/chat/completions", request.model),
        );
        debug!("Sending request to Azure OpenAI API");

        let body: ChatCompletionResponse = send_json(
            self.client
                .post(&url)
                .query(&[("api-version", self.api_version.as_str())])
                .header("api-key", self.api_key.expose_secret())
                .json(&chat::build_request(request, false)),
            PROVIDER,
        )
        .await?;

        chat::extract_text(body, PROVIDER)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
