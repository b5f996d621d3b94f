//! Unified Error Type System
//!
//! Centralized error types for the whole crate.
//!
//! ## Taxonomy
//!
//! - **Config**: run-level, aborts before any generation call
//! - **Scan**: the root directory cannot be walked at all (run-level)
//! - **UnknownModel**: no registered context window for a provider/model pair
//! - **TokenLimitExceeded**: one chunk or document is over the context window
//! - **ProviderUnavailable**: provider key is not one of the supported keys
//! - **MissingCapability**: provider binding not compiled in, or missing credentials
//! - **Backend**: the provider call itself failed (network, auth, rate limit)
//! - **NoSummaries**: a document type had nothing to merge
//!
//! Per-unit errors (one chunk, one document type) are caught by the pipeline
//! and reported; they never abort sibling units.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Backend error categories used by the retry decorator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Context/token limit exceeded on the provider side
    TokenLimit,
    /// Authentication failed - fail fast
    Auth,
    /// Network/connectivity issues
    Network,
    /// Provider or model unavailable
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Provider response could not be parsed
    ParseError,
    /// Temporary server issues
    Transient,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is worth retrying against the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Transient)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Backend failure with category, provider and retry hints
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
    /// Suggested wait time before retry (if the backend sent one)
    pub retry_after: Option<Duration>,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw backend failures onto an [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30));
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
            || lower.contains("context too long")
        {
            return LlmError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5));
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("overloaded")
            || lower.contains("temporar")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider)
                .retry_after(Duration::from_secs(2));
        }

        if lower.contains("parse") || lower.contains("json") || lower.contains("decode") {
            return LlmError::with_provider(ErrorCategory::ParseError, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 422 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            500 | 502 | 503 | 504 | 529 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
                    .retry_after(Duration::from_secs(5))
            }
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a transport-level reqwest failure
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        if err.is_timeout() || err.is_connect() {
            LlmError::with_provider(ErrorCategory::Network, err.to_string(), provider)
                .retry_after(Duration::from_secs(5))
        } else if err.is_decode() {
            LlmError::with_provider(ErrorCategory::ParseError, err.to_string(), provider)
        } else {
            Self::classify(&err.to_string(), provider)
        }
    }
}

// =============================================================================
// Pipeline Stage
// =============================================================================

/// Generation stage a per-unit failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Summarizing,
    Merging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Summarizing => write!(f, "summarizing"),
            Stage::Merging => write!(f, "merging"),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum RunesmithError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    // -------------------------------------------------------------------------
    // Run-level Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Cannot scan {path}: {message}")]
    Scan { path: String, message: String },

    // -------------------------------------------------------------------------
    // Per-unit Errors
    // -------------------------------------------------------------------------
    #[error("Unknown model '{model}' for provider '{provider}'")]
    UnknownModel { provider: String, model: String },

    #[error(
        "Token limit exceeded while {stage} {unit}: {tokens} tokens > {window}-token window"
    )]
    TokenLimitExceeded {
        stage: Stage,
        unit: String,
        tokens: usize,
        window: usize,
    },

    #[error("Unsupported provider '{provider}'. Valid options: {supported}")]
    ProviderUnavailable { provider: String, supported: String },

    #[error("Provider '{provider}' requires {capability}")]
    MissingCapability {
        provider: String,
        capability: String,
    },

    #[error("Backend error: {0}")]
    Backend(LlmError),

    #[error("No chunk summaries available to merge into {doc_type}")]
    NoSummaries { doc_type: String },
}

impl From<LlmError> for RunesmithError {
    fn from(err: LlmError) -> Self {
        RunesmithError::Backend(err)
    }
}

pub type Result<T> = std::result::Result<T, RunesmithError>;

impl RunesmithError {
    pub fn missing_capability(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::MissingCapability {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    /// Check if the retry decorator may try this call again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Wait the backend asked for before another attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Backend(e) => e.retry_after,
            _ => None,
        }
    }

    /// Short machine-readable label used in run reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) | Self::Toml(_) => "io",
            Self::Config(_) => "configuration",
            Self::Scan { .. } => "scan",
            Self::UnknownModel { .. } => "unknown_model",
            Self::TokenLimitExceeded { .. } => "token_limit_exceeded",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::MissingCapability { .. } => "missing_capability",
            Self::Backend(_) => "backend",
            Self::NoSummaries { .. } => "no_summaries",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::TokenLimit.to_string(), "TOKEN_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
        assert!(!ErrorCategory::TokenLimit.is_retryable());
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("Rate limit exceeded, please retry", "openai");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_token_limit() {
        let err = ErrorClassifier::classify("Token limit exceeded: 150000 > 128000", "anthropic");
        assert_eq!(err.category, ErrorCategory::TokenLimit);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify("Invalid API key provided", "openai");
        assert_eq!(err.category, ErrorCategory::Auth);
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 30s", "ollama");
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server_error = ErrorClassifier::classify_http_status(503, "Overloaded", "test");
        assert_eq!(server_error.category, ErrorCategory::Transient);
    }

    #[test]
    fn test_retry_after_only_on_backend_errors() {
        let limited: RunesmithError = LlmError::new(ErrorCategory::RateLimit, "test")
            .retry_after(Duration::from_secs(100))
            .into();
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(100)));

        let plain: RunesmithError = LlmError::new(ErrorCategory::Network, "test").into();
        assert_eq!(plain.retry_after(), None);
        assert_eq!(RunesmithError::Config("x".to_string()).retry_after(), None);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_only_backend_errors_are_retryable() {
        let backend: RunesmithError =
            LlmError::new(ErrorCategory::Transient, "overloaded").into();
        assert!(backend.is_retryable());

        let limit = RunesmithError::TokenLimitExceeded {
            stage: Stage::Summarizing,
            unit: "a.py".to_string(),
            tokens: 10,
            window: 5,
        };
        assert!(!limit.is_retryable());
        assert_eq!(limit.kind(), "token_limit_exceeded");
        assert!(limit.to_string().contains("summarizing a.py"));
    }
}
