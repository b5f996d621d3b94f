//! Provider Registry
//!
//! Holds constructors, not instances. A provider is built the first time its
//! key is selected and then reused for the rest of the run, so a missing
//! credential for an unused provider never fails startup.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{ProviderConfig, ProviderKind, SharedProvider};
use crate::types::{Result, RunesmithError};

/// Builds one provider from its settings
pub type ProviderConstructor = Arc<dyn Fn(&ProviderConfig) -> Result<SharedProvider> + Send + Sync>;

pub struct ProviderRegistry {
    constructors: HashMap<ProviderKind, ProviderConstructor>,
    configs: HashMap<ProviderKind, ProviderConfig>,
    instances: DashMap<ProviderKind, SharedProvider>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut registered: Vec<_> = self.constructors.keys().map(|k| k.key()).collect();
        registered.sort();
        f.debug_struct("ProviderRegistry")
            .field("registered", &registered)
            .field("configs", &self.configs)
            .field("instances", &self.instances.len())
            .finish()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    /// Registry with no providers; tests register scripted ones
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            configs: HashMap::new(),
            instances: DashMap::new(),
        }
    }

    /// Registry with every built-in binding
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kind in ProviderKind::ALL {
            registry.constructors.insert(kind, builtin_constructor(kind));
        }
        registry
    }

    pub fn with_config(mut self, kind: ProviderKind, config: ProviderConfig) -> Self {
        self.configs.insert(kind, config);
        self.instances.remove(&kind);
        self
    }

    /// Register or replace the constructor for `kind`
    pub fn register<F>(&mut self, kind: ProviderKind, constructor: F)
    where
        F: Fn(&ProviderConfig) -> Result<SharedProvider> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Arc::new(constructor));
        self.instances.remove(&kind);
    }

    /// Provider for `kind`, constructing it on first use
    pub fn get(&self, kind: ProviderKind) -> Result<SharedProvider> {
        if let Some(instance) = self.instances.get(&kind) {
            return Ok(Arc::clone(instance.value()));
        }

        let constructor = self.constructors.get(&kind).ok_or_else(|| {
            let mut keys: Vec<_> = self.constructors.keys().map(|k| k.key()).collect();
            keys.sort();
            RunesmithError::ProviderUnavailable {
                provider: kind.key().to_string(),
                supported: keys.join(", "),
            }
        })?;

        let default_config = ProviderConfig::default();
        let config = self.configs.get(&kind).unwrap_or(&default_config);

        debug!("Constructing provider: {}", kind);
        let entry = self
            .instances
            .entry(kind)
            .or_try_insert_with(|| constructor(config))?;
        Ok(Arc::clone(entry.value()))
    }
}

// =============================================================================
// Built-in Constructors
// =============================================================================

fn builtin_constructor(kind: ProviderKind) -> ProviderConstructor {
    match kind {
        ProviderKind::OpenAi => Arc::new(build_openai),
        ProviderKind::AzureOpenAi => Arc::new(build_azure),
        ProviderKind::Anthropic => Arc::new(build_anthropic),
        ProviderKind::Google => Arc::new(build_google),
        ProviderKind::Ollama => Arc::new(build_ollama),
    }
}

#[cfg_attr(
    all(
        feature = "openai",
        feature = "azureopenai",
        feature = "anthropic",
        feature = "google",
        feature = "ollama"
    ),
    allow(dead_code)
)]
fn feature_disabled(kind: ProviderKind) -> RunesmithError {
    RunesmithError::missing_capability(
        kind.key(),
        format!("the '{}' cargo feature", kind.key()),
    )
}

#[cfg(feature = "openai")]
fn build_openai(config: &ProviderConfig) -> Result<SharedProvider> {
    Ok(Arc::new(super::OpenAiProvider::new(config)?))
}

#[cfg(not(feature = "openai"))]
fn build_openai(_config: &ProviderConfig) -> Result<SharedProvider> {
    Err(feature_disabled(ProviderKind::OpenAi))
}

#[cfg(feature = "azureopenai")]
fn build_azure(config: &ProviderConfig) -> Result<SharedProvider> {
    Ok(Arc::new(super::AzureOpenAiProvider::new(config)?))
}

#[cfg(not(feature = "azureopenai"))]
fn build_azure(_config: &ProviderConfig) -> Result<SharedProvider> {
    Err(feature_disabled(ProviderKind::AzureOpenAi))
}

#[cfg(feature = "anthropic")]
fn build_anthropic(config: &ProviderConfig) -> Result<SharedProvider> {
    Ok(Arc::new(super::AnthropicProvider::new(config)?))
}

#[cfg(not(feature = "anthropic"))]
fn build_anthropic(_config: &ProviderConfig) -> Result<SharedProvider> {
    Err(feature_disabled(ProviderKind::Anthropic))
}

#[cfg(feature = "google")]
fn build_google(config: &ProviderConfig) -> Result<SharedProvider> {
    Ok(Arc::new(super::GeminiProvider::new(config)?))
}

#[cfg(not(feature = "google"))]
fn build_google(_config: &ProviderConfig) -> Result<SharedProvider> {
    Err(feature_disabled(ProviderKind::Google))
}

#[cfg(feature = "ollama")]
fn build_ollama(config: &ProviderConfig) -> Result<SharedProvider> {
    Ok(Arc::new(super::OllamaProvider::new(config)?))
}

#[cfg(not(feature = "ollama"))]
fn build_ollama(_config: &ProviderConfig) -> Result<SharedProvider> {
    Err(feature_disabled(ProviderKind::Ollama))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{GenerationRequest, LlmProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    #[async_trait]
    impl LlmProvider for Echo {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            Ok(request.user_prompt.clone())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_constructs_lazily_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let mut registry = ProviderRegistry::empty();
        registry.register(ProviderKind::Anthropic, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Echo) as SharedProvider)
        });
        assert_eq!(built.load(Ordering::SeqCst), 0);

        registry.get(ProviderKind::Anthropic).unwrap();
        registry.get(ProviderKind::Anthropic).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregistered_kind() {
        let registry = ProviderRegistry::empty();
        assert!(matches!(
            registry.get(ProviderKind::Ollama),
            Err(RunesmithError::ProviderUnavailable { .. })
        ));
    }

    #[test]
    fn test_failed_construction_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let mut registry = ProviderRegistry::empty();
        registry.register(ProviderKind::OpenAi, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RunesmithError::missing_capability("openai", "an API key"))
        });

        for _ in 0..2 {
            assert!(matches!(
                registry.get(ProviderKind::OpenAi),
                Err(RunesmithError::MissingCapability { .. })
            ));
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_config_passed_to_constructor() {
        let mut registry = ProviderRegistry::empty().with_config(
            ProviderKind::Google,
            ProviderConfig {
                max_tokens: 77,
                ..Default::default()
            },
        );
        registry.register(ProviderKind::Google, |config| {
            assert_eq!(config.max_tokens, 77);
            Ok(Arc::new(Echo) as SharedProvider)
        });
        assert!(registry.get(ProviderKind::Google).is_ok());
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_builtin_ollama_needs_no_credentials() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.get(ProviderKind::Ollama).unwrap().name(), "ollama");
    }
}
