pub mod error;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, RunesmithError, Stage};

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// A requested documentation type such as "Readme" or "API documentation"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocType(String);

impl DocType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Artifact key: lower-cased, spaces replaced with underscores
    pub fn artifact_key(&self) -> String {
        self.0.to_lowercase().replace(' ', "_")
    }

    /// Final artifact filename (`{key}.md`)
    pub fn artifact_file_name(&self) -> String {
        format!("{}.md", self.artifact_key())
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_key_normalization() {
        assert_eq!(DocType::from("Readme").artifact_key(), "readme");
        assert_eq!(
            DocType::from("API documentation").artifact_file_name(),
            "api_documentation.md"
        );
        assert_eq!(
            DocType::from("Quickstart guide").artifact_file_name(),
            "quickstart_guide.md"
        );
    }
}
