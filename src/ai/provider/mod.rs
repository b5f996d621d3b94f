//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait: one uniform capability mapping
//! (model, system instruction, user prompt, temperature) to generated text.
//!
//! ## Modules
//!
//! - `registry`: lazily constructed provider instances keyed by [`ProviderKind`]
//! - `gateway`: provider selection, optional retry, fence unwrapping
//! - `fence`: markdown fence normalization applied to every response
//! - one module per backend binding, each behind a cargo feature

mod fence;
mod gateway;
mod registry;

#[cfg(any(
    feature = "openai",
    feature = "azureopenai",
    feature = "anthropic",
    feature = "google",
    feature = "ollama"
))]
mod http;

#[cfg(any(feature = "azureopenai", feature = "ollama"))]
mod chat;

#[cfg(feature = "anthropic")]
mod anthropic;
#[cfg(feature = "azureopenai")]
mod azure;
#[cfg(feature = "google")]
mod gemini;
#[cfg(feature = "ollama")]
mod ollama;
#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;
#[cfg(feature = "azureopenai")]
pub use azure::AzureOpenAiProvider;
#[cfg(feature = "google")]
pub use gemini::GeminiProvider;
#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

pub use fence::unwrap_markdown_block;
pub use gateway::GenerationGateway;
pub use registry::{ProviderConstructor, ProviderRegistry};

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::llm::DEFAULT_TEMPERATURE;
use crate::constants::network::DEFAULT_TIMEOUT_SECS;
use crate::constants::llm::DEFAULT_MAX_TOKENS;
use crate::types::{Result, RunesmithError};

/// Shared LLM provider type for concurrent access across pipeline stages.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Kind
// =============================================================================

/// Fixed enumeration of supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    AzureOpenAi,
    Anthropic,
    #[serde(alias = "gemini")]
    Google,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        Self::OpenAi,
        Self::AzureOpenAi,
        Self::Anthropic,
        Self::Google,
        Self::Ollama,
    ];

    /// Canonical lowercase key
    pub fn key(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::AzureOpenAi => "azureopenai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Ollama => "ollama",
        }
    }

    /// Comma-separated list of accepted keys, for error messages
    pub fn supported_keys() -> String {
        Self::ALL
            .iter()
            .map(|k| k.key())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ProviderKind {
    type Err = RunesmithError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azureopenai" => Ok(Self::AzureOpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "google" | "gemini" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            _ => Err(RunesmithError::ProviderUnavailable {
                provider: s.to_string(),
                supported: Self::supported_keys(),
            }),
        }
    }
}

// =============================================================================
// Generation Request
// =============================================================================

/// One generation call. Never retained after the call returns.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: String,
    pub user_prompt: String,
    pub temperature: f32,
    /// Provider key; `None` selects the gateway default
    pub provider: Option<String>,
}

impl GenerationRequest {
    pub fn new(
        model: impl Into<String>,
        system_instruction: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_instruction: system_instruction.into(),
            user_prompt: user_prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            provider: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Construction-time settings for one provider binding
///
/// Note: API keys are never serialized and are redacted in debug output.
/// Each provider converts the key to SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Output cap for providers that require one
    pub max_tokens: usize,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL / endpoint override
    #[serde(default)]
    pub api_base: Option<String>,
    /// API version (Azure only)
    #[serde(default)]
    pub api_version: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: None,
            api_base: None,
            api_version: None,
        }
    }
}

impl ProviderConfig {
    /// Configured value, else the named environment variable
    pub(crate) fn key_or_env(&self, var: &str) -> Option<String> {
        non_empty(self.api_key.clone()).or_else(|| non_empty(std::env::var(var).ok()))
    }

    pub(crate) fn base_or_env(&self, var: &str) -> Option<String> {
        non_empty(self.api_base.clone()).or_else(|| non_empty(std::env::var(var).ok()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text. The system instruction always precedes the user
    /// prompt, whatever the backend's call shape.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
