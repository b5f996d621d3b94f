//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// Scanner constants
pub mod scan {
    /// Label used for files without an extension
    pub const NO_EXTENSION: &str = "(no extension)";

    /// Ignore-rules file read from the scanned root
    pub const IGNORE_FILE: &str = ".gitignore";

    /// Version-control directory, always excluded
    pub const VCS_DIR: &str = ".git";
}

/// Token counting constants
pub mod tokens {
    /// General-purpose encoding used when a model has no known tokenizer
    pub const FALLBACK_ENCODING: &str = "o200k_base";
}

/// Pipeline constants
pub mod pipeline {
    /// Per-chunk cache directory name under the output directory
    pub const DEFAULT_CACHE_DIR: &str = "cache_docs";

    /// Concurrent per-chunk summarization calls
    pub const DEFAULT_SUMMARY_CONCURRENCY: usize = 4;

    /// Concurrent per-document merge calls
    pub const DEFAULT_MERGE_CONCURRENCY: usize = 2;

    /// Separator between chunk summaries in the merge draft
    pub const SUMMARY_SEPARATOR: &str = "\n\n";
}

/// LLM provider constants
pub mod llm {
    pub const DEFAULT_PROVIDER: &str = "openai";

    pub const DEFAULT_MODEL: &str = "gpt-4.1";

    /// Output cap for providers that require one (Anthropic)
    pub const DEFAULT_MAX_TOKENS: usize = 4096;

    pub const DEFAULT_TEMPERATURE: f32 = 0.0;

    pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";
}

/// Retry decorator constants
pub mod retry {
    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
