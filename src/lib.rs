//! runesmith - Chunk-and-Merge Documentation Generator
//!
//! Walks a source tree, summarizes every file with an LLM, and merges the
//! summaries into one document per requested documentation type.
//!
//! ## Core Features
//!
//! - **Two-stage pipeline**: per-file summaries, then one merge per document
//! - **Admission control**: exact prompt token counts checked against the
//!   model's context window before every call
//! - **Pluggable providers**: OpenAI, Azure OpenAI, Anthropic, Gemini, Ollama
//! - **Update mode**: existing documents are revised, not rewritten
//!
//! ## Quick Start
//!
//! ```ignore
//! use runesmith::{ConfigLoader, CliOverrides, Pipeline};
//!
//! let config = ConfigLoader::load(None, &CliOverrides::default())?;
//! let report = Pipeline::new(config)?.run().await?;
//! for artifact in &report.artifacts {
//!     println!("wrote {}", artifact.display());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`scanner`]: source tree walking with ignore rules and blacklist
//! - [`ai`]: token budgeting, provider bindings, prompts
//! - [`pipeline`]: the orchestrator, artifact store and run report
//! - [`config`]: layered configuration
//! - [`cli`]: command handlers

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod scanner;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{CliOverrides, Config, ConfigLoader};

// Error Types
pub use types::{DocType, ErrorCategory, Result, RunesmithError};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{Pipeline, PipelineStage, PipelineWarning, RunReport, UnitFailure};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    GenerationGateway, GenerationRequest, LlmProvider, ProviderKind, ProviderRegistry,
    TokenBudgetOracle,
};

pub use scanner::{Chunk, FileScanner};
