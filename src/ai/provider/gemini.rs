//! Google Gemini Provider
//!
//! `generateContent` with a dedicated `systemInstruction` and the user prompt
//! as the only `contents` entry.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_client, join_url, send_json};
use super::{GenerationRequest, LlmProvider, ProviderConfig};
use crate::types::{ErrorCategory, LlmError, Result, RunesmithError};

const PROVIDER: &str = "google";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const API_KEY_VAR: &str = "GEMINI_API_KEY";

pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.key_or_env(API_KEY_VAR).ok_or_else(|| {
            RunesmithError::missing_capability(
                PROVIDER,
                format!("an API key (set {} or providers.google.api_key)", API_KEY_VAR),
            )
        })?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: build_client(config.timeout_secs, PROVIDER)?,
        })
    }

    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(request.system_instruction.clone()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.user_prompt.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(
            "Generating with Gemini (model: {}, temperature: {})",
            request.model, request.temperature
        );

        let url = join_url(
            &self.api_base,
            &format!("v1beta/models/{}:generateContent", request.model),
        );
        debug!("Sending request to Gemini API");

        let body: GenerateContentResponse = send_json(
            self.client
                .post(&url)
                .header("x-goog-api-key", self.api_key.expose_secret())
                .json(&Self::build_request(request)),
            PROVIDER,
        )
        .await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ParseError,
                "No candidates in Gemini response",
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
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
