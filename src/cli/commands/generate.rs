//! Generate Command
//!
//! Runs the chunk-and-merge pipeline over the configured code tree.
//!
//! Usage:
//!   runesmith generate [--provider P] [--model M] [--code-path DIR]
//!                      [--output DIR] [--doc-type T ...] [--dry-run]

use std::path::PathBuf;

use tokio::runtime::Runtime;
use tracing::info;

use crate::cli::Output;
use crate::config::{CliOverrides, ConfigFormat, ConfigLoader};
use crate::pipeline::{Pipeline, RunReport};
use crate::types::Result;

/// Generate run options
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Command-line overrides of file/env values
    pub overrides: CliOverrides,
    /// Print the resolved configuration and scan preview only
    pub dry_run: bool,
}

/// Returns `true` when every unit produced output
pub fn run(options: GenerateOptions) -> Result<bool> {
    let config = ConfigLoader::load(options.config.as_deref(), &options.overrides)?;
    let out = Output::new();
    let pipeline = Pipeline::new(config)?;

    if options.dry_run {
        return dry_run(&pipeline, &out);
    }

    let config = pipeline.config();
    out.header("runesmith");
    out.field("Provider", &config.provider);
    out.field("Model", &config.model);
    out.field("Code path", config.code_path.display());
    out.field("Output", config.output_dir.display());

    let rt = Runtime::new()?;
    let report = rt.block_on(pipeline.run())?;
    info!(
        "Run finished: {} artifacts, {} failures, {} warnings",
        report.artifacts.len(),
        report.failures.len(),
        report.warnings.len()
    );

    out.run_report(&report);
    Ok(report.is_success())
}

fn dry_run(pipeline: &Pipeline, out: &Output) -> Result<bool> {
    out.header("[Dry Run] Resolved configuration");
    println!("{}", ConfigLoader::render(pipeline.config(), ConfigFormat::Toml)?);

    let mut report = RunReport::default();
    let chunks = pipeline.scan(&mut report)?;

    out.section("Scan preview");
    out.field("Chunks", chunks.len());
    out.field("Skipped", report.warnings.len());
    for chunk in &chunks {
        println!("    {}", chunk.path);
    }
    for warning in &report.warnings {
        out.warning(&warning.to_string());
    }

    out.info("No generation calls were made");
    Ok(true)
}
