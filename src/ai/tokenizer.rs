//! Token Counting
//!
//! Counts tokens exactly as a request will be sent, using a BPE tokenizer
//! per model.
//!
//! ## Fallback chain
//! 1. Model-specific BPE (`tiktoken-rs` model table)
//! 2. `o200k_base` general-purpose encoding
//! 3. Code-aware character heuristic, only if no BPE table can be loaded
//!
//! Reserved markers such as `<|endoftext|>` are always encoded as ordinary
//! text, never as control tokens.

use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

use crate::constants::tokens::FALLBACK_ENCODING;

/// Which fallback produced a count, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenizerFallback {
    /// The model has no known tokenizer; a general encoding was used
    Encoding(&'static str),
    /// No BPE table could be loaded; the count is an estimate
    Heuristic,
}

impl fmt::Display for TokenizerFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding(name) => write!(f, "{}", name),
            Self::Heuristic => write!(f, "heuristic estimate"),
        }
    }
}

/// Result of a count: the number and the fallback that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCount {
    pub count: usize,
    pub fallback: Option<TokenizerFallback>,
}

/// Token counter with per-model encoder cache
#[derive(Default)]
pub struct TokenCounter {
    /// `None` marks a model without a specific tokenizer
    encoders: DashMap<String, Option<Arc<CoreBPE>>>,
    general: OnceLock<Option<Arc<CoreBPE>>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count tokens in `text` for `model`
    pub fn count(&self, text: &str, model: &str) -> TokenCount {
        if let Some(bpe) = self.model_encoder(model) {
            return TokenCount {
                count: bpe.encode_ordinary(text).len(),
                fallback: None,
            };
        }

        if let Some(bpe) = self.general_encoder() {
            return TokenCount {
                count: bpe.encode_ordinary(text).len(),
                fallback: Some(TokenizerFallback::Encoding(FALLBACK_ENCODING)),
            };
        }

        TokenCount {
            count: estimate_code_tokens(text),
            fallback: Some(TokenizerFallback::Heuristic),
        }
    }

    /// Count the exact text a request sends: system instruction, a single
    /// line break, then the user prompt.
    pub fn count_prompt(&self, system_instruction: &str, user_prompt: &str, model: &str) -> TokenCount {
        let mut full = String::with_capacity(system_instruction.len() + user_prompt.len() + 1);
        full.push_str(system_instruction);
        full.push('\n');
        full.push_str(user_prompt);
        self.count(&full, model)
    }

    fn model_encoder(&self, model: &str) -> Option<Arc<CoreBPE>> {
        if let Some(cached) = self.encoders.get(model) {
            return cached.clone();
        }

        let encoder = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(e) => {
                debug!("No specific tokenizer for {}: {}", model, e);
                None
            }
        };
        self.encoders.insert(model.to_string(), encoder.clone());
        encoder
    }

    fn general_encoder(&self) -> Option<Arc<CoreBPE>> {
        self.general
            .get_or_init(|| match tiktoken_rs::o200k_base() {
                Ok(bpe) => Some(Arc::new(bpe)),
                Err(e) => {
                    warn!("Failed to load {} encoding: {}", FALLBACK_ENCODING, e);
                    None
                }
            })
            .clone()
    }
}

// =============================================================================
// Heuristic Estimation
// =============================================================================

/// Code-aware estimate used only when no BPE table is available.
/// Punctuation and operators count as one token each; words are split
/// roughly every four characters.
pub fn estimate_code_tokens(text: &str) -> usize {
    let mut tokens = 0;
    let mut word_len = 0usize;

    for ch in text.chars() {
        match ch {
            '(' | ')' | '{' | '}' | '[' | ']' | ';' | ':' | ',' | '.' | '+' | '-' | '*'
            | '/' | '=' | '<' | '>' | '!' | '&' | '|' | '@' | '#' | '$' | '%' | '^' | '~'
            | '?' | '\\' | '"' | '\'' => {
                tokens += word_tokens(word_len);
                word_len = 0;
                tokens += 1;
            }
            c if c.is_whitespace() => {
                tokens += word_tokens(word_len);
                word_len = 0;
            }
            _ => word_len += 1,
        }
    }

    tokens + word_tokens(word_len)
}

fn word_tokens(len: usize) -> usize {
    match len {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        _ => len.div_ceil(4),
    }
}
