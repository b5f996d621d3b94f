//! Token Budget Oracle
//!
//! Admission control for generation calls: counts the exact prompt text and
//! compares it against the model's context window before any call is made.

use super::models::{ContextWindow, ModelRegistry, ModelSpec};
use super::provider::ProviderKind;
use super::tokenizer::{TokenCount, TokenCounter, TokenizerFallback};
use crate::types::Result;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub tokens: usize,
    pub window: ContextWindow,
    pub fallback: Option<TokenizerFallback>,
}

impl Admission {
    pub fn fits(&self) -> bool {
        self.window.admits(self.tokens)
    }
}

#[derive(Default)]
pub struct TokenBudgetOracle {
    counter: TokenCounter,
    registry: ModelRegistry,
}

impl TokenBudgetOracle {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            counter: TokenCounter::new(),
            registry,
        }
    }

    pub fn count_tokens(&self, text: &str, model: &str) -> TokenCount {
        self.counter.count(text, model)
    }

    pub fn context_window(&self, provider: ProviderKind, model: &str) -> ContextWindow {
        self.registry.context_window(provider, model)
    }

    /// Registered entry for the pair; `UnknownModel` when there is none
    pub fn model_spec(&self, provider: ProviderKind, model: &str) -> Result<ModelSpec> {
        self.registry.spec(provider, model)
    }

    /// Count `system_instruction` + newline + `user_prompt` and look up the window
    pub fn check(
        &self,
        provider: ProviderKind,
        model: &str,
        system_instruction: &str,
        user_prompt: &str,
    ) -> Admission {
        let count = self
            .counter
            .count_prompt(system_instruction, user_prompt, model);
        Admission {
            tokens: count.count,
            window: self.registry.context_window(provider, model),
            fallback: count.fallback,
        }
    }
}
