//! Configuration Types
//!
//! All configuration structures with sensible defaults. The top-level fields
//! are the run inputs; nested tables tune the model calls, the pipeline and
//! per-provider credentials.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::ai::provider::{ProviderConfig, ProviderKind};
use crate::constants::{llm, network, pipeline};
use crate::types::{DocType, Result, RunesmithError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider key, resolved once per run
    pub provider: String,

    /// Model name (provider-specific)
    pub model: String,

    /// Root of the source tree to document
    pub code_path: PathBuf,

    /// Directory receiving final artifacts and the chunk cache
    pub output_dir: PathBuf,

    /// Extensions to skip, e.g. ".lock"; `(no extension)` matches bare names
    pub blacklist: Vec<String>,

    /// Requested documentation types
    pub doc_types: Vec<DocType>,

    /// Appended to every document instruction
    pub custom_instructions: String,

    pub llm: LlmConfig,

    pub pipeline: PipelineConfig,

    /// Credentials and endpoints keyed by provider
    pub providers: BTreeMap<String, ProviderCredentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: llm::DEFAULT_PROVIDER.to_string(),
            model: llm::DEFAULT_MODEL.to_string(),
            code_path: PathBuf::from("."),
            output_dir: PathBuf::from("docs"),
            blacklist: Vec::new(),
            doc_types: vec![DocType::from("Readme")],
            custom_instructions: String::new(),
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
            providers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `RunesmithError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.provider_kind()?;

        if self.model.trim().is_empty() {
            return Err(RunesmithError::Config("model must not be empty".to_string()));
        }

        if self.doc_types.is_empty() {
            return Err(RunesmithError::Config(
                "No documentation types requested".to_string(),
            ));
        }

        let mut keys = HashSet::new();
        for doc_type in &self.doc_types {
            if doc_type.as_str().trim().is_empty() {
                return Err(RunesmithError::Config(
                    "Documentation type names must not be empty".to_string(),
                ));
            }
            if !keys.insert(doc_type.artifact_key()) {
                return Err(RunesmithError::Config(format!(
                    "Documentation type '{}' collides with another type on {}",
                    doc_type,
                    doc_type.artifact_file_name()
                )));
            }
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(RunesmithError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(RunesmithError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.context_window == Some(0) {
            return Err(RunesmithError::Config(
                "LLM context_window override must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.summary_concurrency == 0 || self.pipeline.merge_concurrency == 0 {
            return Err(RunesmithError::Config(
                "Pipeline concurrency must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.cache_dir.trim().is_empty() {
            return Err(RunesmithError::Config(
                "Pipeline cache_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed provider key. An unsupported key is a configuration error.
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.provider
            .parse()
            .map_err(|e: RunesmithError| RunesmithError::Config(e.to_string()))
    }

    /// Construction settings for one provider binding
    pub fn provider_config(&self, kind: ProviderKind) -> ProviderConfig {
        let credentials = self
            .providers
            .iter()
            .find(|(key, _)| key.parse::<ProviderKind>().ok() == Some(kind))
            .map(|(_, creds)| creds.clone())
            .unwrap_or_default();

        ProviderConfig {
            timeout_secs: self.llm.timeout_secs,
            max_tokens: self.llm.max_tokens,
            api_key: credentials.api_key,
            api_base: credentials.api_base,
            api_version: credentials.api_version,
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Temperature for LLM generation (0.0 = deterministic)
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Output cap for providers that require one
    pub max_tokens: usize,

    /// Retries for retryable backend failures; 0 disables retrying
    pub max_retries: usize,

    /// Context window override for the configured model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<usize>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: llm::DEFAULT_TEMPERATURE,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
            max_retries: 0,
            context_window: None,
        }
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concurrent per-chunk summarization calls
    pub summary_concurrency: usize,

    /// Concurrent per-document merge calls
    pub merge_concurrency: usize,

    /// Chunk cache directory, relative to the output directory
    pub cache_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            summary_concurrency: pipeline::DEFAULT_SUMMARY_CONCURRENCY,
            merge_concurrency: pipeline::DEFAULT_MERGE_CONCURRENCY,
            cache_dir: pipeline::DEFAULT_CACHE_DIR.to_string(),
        }
    }
}

// =============================================================================
// Provider Credentials
// =============================================================================

/// Per-provider credentials. Each field falls back to the provider's
/// environment variable when unset.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    /// Never serialized to output
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

// =============================================================================
// Tests
// =============================================================================
