//! Run Report
//!
//! Everything a run produced or skipped: summaries in chunk order, written
//! artifacts, per-unit failures and the warning channel.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use crate::ai::provider::ProviderKind;
use crate::scanner::ScanWarning;
use crate::types::{RunesmithError, Stage};

/// Pipeline state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Scanning,
    Summarizing,
    Merging,
    Done,
    Aborted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scanning => write!(f, "scanning"),
            Self::Summarizing => write!(f, "summarizing"),
            Self::Merging => write!(f, "merging"),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Something skipped or degraded that the user must be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    Scan(ScanWarning),
    TokenizerFallback { model: String, fallback: String },
    UnknownModel { provider: ProviderKind, model: String },
    CacheCollision { key: String, first: String, second: String },
    CacheWrite { path: String, reason: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(w) => write!(f, "{}", w),
            Self::TokenizerFallback { model, fallback } => write!(
                f,
                "No tokenizer known for model '{}'; token counts use {}",
                model, fallback
            ),
            Self::UnknownModel { provider, model } => write!(
                f,
                "Unknown model '{}' for provider '{}'; context window treated as unbounded",
                model, provider
            ),
            Self::CacheCollision { key, first, second } => write!(
                f,
                "Cache file {} is shared by {} and {}; the later summary overwrites it",
                key, first, second
            ),
            Self::CacheWrite { path, reason } => {
                write!(f, "Could not write cache file {}: {}", path, reason)
            }
        }
    }
}

/// One chunk or document type that did not produce output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub stage: Stage,
    /// Chunk path or document type
    pub unit: String,
    /// Error label, see [`RunesmithError::kind`]
    pub kind: &'static str,
    pub reason: String,
}

impl UnitFailure {
    pub fn new(stage: Stage, unit: impl Into<String>, error: &RunesmithError) -> Self {
        Self {
            stage,
            unit: unit.into(),
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.unit, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub path: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub stage: PipelineStage,
    pub chunk_count: usize,
    /// Successful summaries, in chunk order
    pub summaries: Vec<ChunkSummary>,
    pub cache_artifacts: Vec<PathBuf>,
    pub artifacts: Vec<PathBuf>,
    pub failures: Vec<UnitFailure>,
    pub warnings: Vec<PipelineWarning>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            stage: PipelineStage::Scanning,
            chunk_count: 0,
            summaries: Vec::new(),
            cache_artifacts: Vec::new(),
            artifacts: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl RunReport {
    /// Record a warning once; repeats are dropped
    pub fn warn(&mut self, warning: PipelineWarning) {
        if self.warnings.contains(&warning) {
            return;
        }
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn fail(&mut self, failure: UnitFailure) {
        warn!("{}", failure);
        self.failures.push(failure);
    }

    pub fn failures_in(&self, stage: Stage) -> impl Iterator<Item = &UnitFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    /// True when every unit produced output
    pub fn is_success(&self) -> bool {
        self.stage == PipelineStage::Done && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_deduplicated() {
        let mut report = RunReport::default();
        let warning = PipelineWarning::TokenizerFallback {
            model: "claude-3-opus".to_string(),
            fallback: "o200k_base".to_string(),
        };
        report.warn(warning.clone());
        report.warn(warning);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_success_requires_done_without_failures() {
        let mut report = RunReport::default();
        assert!(!report.is_success());

        report.stage = PipelineStage::Done;
        assert!(report.is_success());

        report.fail(UnitFailure::new(
            Stage::Merging,
            "Readme",
            &RunesmithError::Config("x".to_string()),
        ));
        assert!(!report.is_success());
        assert_eq!(report.failures_in(Stage::Merging).count(), 1);
        assert_eq!(report.failures_in(Stage::Summarizing).count(), 0);
    }
}
