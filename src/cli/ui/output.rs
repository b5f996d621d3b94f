use console::style;

use crate::pipeline::{PipelineStage, RunReport};

/// Styled terminal messages
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<16} {}", format!("{}:", label), value);
    }

    /// Summary of a finished (or aborted) run
    pub fn run_report(&self, report: &RunReport) {
        self.section("Run Summary");
        self.field("Stage", report.stage);
        self.field("Chunks", report.chunk_count);
        self.field(
            "Summaries",
            format!("{}/{}", report.summaries.len(), report.chunk_count),
        );
        self.field("Cache files", report.cache_artifacts.len());

        if !report.warnings.is_empty() {
            self.section(&format!("Warnings ({})", report.warnings.len()));
            for warning in &report.warnings {
                self.warning(&warning.to_string());
            }
        }

        if !report.failures.is_empty() {
            self.section(&format!("Failures ({})", report.failures.len()));
            for failure in &report.failures {
                self.error(&failure.to_string());
            }
        }

        println!();
        for artifact in &report.artifacts {
            self.success(&format!("Wrote {}", artifact.display()));
        }

        if report.is_success() {
            self.success("Documentation generated");
        } else if report.stage == PipelineStage::Done {
            self.warning(&format!(
                "Finished with {} failed unit(s)",
                report.failures.len()
            ));
        } else {
            self.error(&format!("Run stopped during {}", report.stage));
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
