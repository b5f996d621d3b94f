//! AI Integration Layer
//!
//! Token budgeting, model reference data, provider bindings and prompts.

pub mod budget;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod tokenizer;

pub use budget::{Admission, TokenBudgetOracle};
pub use models::{ContextWindow, ModelRegistry, ModelSpec};
pub use prompt::{Instruction, InstructionMode, PromptBuilder, PromptTemplates, build_instruction};
pub use provider::{
    ErrorCategory, ErrorClassifier, GenerationGateway, GenerationRequest, LlmError, LlmProvider,
    ProviderConfig, ProviderKind, ProviderRegistry, SharedProvider, unwrap_markdown_block,
};
pub use tokenizer::{TokenCount, TokenCounter, TokenizerFallback};
