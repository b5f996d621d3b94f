//! Model Registry
//!
//! Read-only context-window reference data per (provider, model) pair.
//! Unknown pairs never stop a run: their window is reported as unbounded so
//! the caller can still attempt the call and surface a warning. [`ModelRegistry::spec`]
//! names the condition as [`RunesmithError::UnknownModel`].

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::provider::ProviderKind;
use crate::types::{Result, RunesmithError};

/// Registered model with its context window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model: String,
    pub context_window: usize,
}

/// Context window lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextWindow {
    Limited(usize),
    /// No limit known for this provider/model pair
    Unbounded,
}

impl ContextWindow {
    /// Whether `tokens` fits. Unbounded windows admit everything.
    pub fn admits(&self, tokens: usize) -> bool {
        match self {
            Self::Limited(limit) => tokens <= *limit,
            Self::Unbounded => true,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Limited(limit) => Some(*limit),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(limit) => write!(f, "{}", limit),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

const BUILTIN_MODELS: &[(ProviderKind, &str, usize)] = &[
    (ProviderKind::OpenAi, "gpt-4.1", 1_000_000),
    (ProviderKind::OpenAi, "gpt-4o", 128_000),
    (ProviderKind::OpenAi, "gpt-4.5", 128_000),
    (ProviderKind::OpenAi, "gpt-4-turbo", 128_000),
    (ProviderKind::AzureOpenAi, "gpt-4o", 128_000),
    (ProviderKind::AzureOpenAi, "gpt-4-turbo", 128_000),
    (ProviderKind::AzureOpenAi, "gpt-4o-mini", 128_000),
    (ProviderKind::Anthropic, "claude-3.7-sonnet", 200_000),
    (ProviderKind::Anthropic, "claude-3.5-haiku", 200_000),
    (ProviderKind::Anthropic, "claude-3-opus", 200_000),
    (ProviderKind::Google, "gemini-2.5-pro-preview-03-25", 1_000_000),
    (ProviderKind::Google, "gemini-2.5-flash-preview-04-17", 1_000_000),
    (ProviderKind::Google, "gemini-2.0-flash", 1_000_000),
    (ProviderKind::Google, "gemini-1.5-pro", 2_000_000),
];

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    windows: HashMap<(ProviderKind, String), usize>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelRegistry {
    pub fn builtin() -> Self {
        let windows = BUILTIN_MODELS
            .iter()
            .map(|(provider, model, window)| ((*provider, model.to_string()), *window))
            .collect();
        Self { windows }
    }

    /// Register or override a window
    pub fn with_window(mut self, provider: ProviderKind, model: &str, window: usize) -> Self {
        self.windows.insert((provider, model.to_string()), window);
        self
    }

    pub fn context_window(&self, provider: ProviderKind, model: &str) -> ContextWindow {
        self.windows
            .get(&(provider, model.to_string()))
            .map(|w| ContextWindow::Limited(*w))
            .unwrap_or(ContextWindow::Unbounded)
    }

    /// Registered entry for a pair, or `UnknownModel`
    pub fn spec(&self, provider: ProviderKind, model: &str) -> Result<ModelSpec> {
        match self.windows.get(&(provider, model.to_string())) {
            Some(window) => Ok(ModelSpec {
                provider,
                model: model.to_string(),
                context_window: *window,
            }),
            None => Err(RunesmithError::UnknownModel {
                provider: provider.key().to_string(),
                model: model.to_string(),
            }),
        }
    }

    /// Registered models for a provider, sorted by name
    pub fn models_for(&self, provider: ProviderKind) -> Vec<ModelSpec> {
        let mut specs: Vec<ModelSpec> = self
            .windows
            .iter()
            .filter(|((p, _), _)| *p == provider)
            .map(|((p, model), window)| ModelSpec {
                provider: *p,
                model: model.clone(),
                context_window: *window,
            })
            .collect();
        specs.sort_by(|a, b| a.model.cmp(&b.model));
        specs
    }
}
