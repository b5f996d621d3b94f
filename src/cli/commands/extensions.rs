//! Extensions Command
//!
//! Lists the distinct file extensions under a directory, after ignore rules
//! and before the blacklist, to help choose what to blacklist.

use std::path::Path;

use crate::cli::Output;
use crate::scanner::FileScanner;
use crate::types::Result;

pub fn run(path: &Path) -> Result<()> {
    let extensions = FileScanner::new(path).extensions()?;
    let out = Output::new();

    if extensions.is_empty() {
        out.info(&format!("No files found under {}", path.display()));
        return Ok(());
    }

    out.section(&format!("Extensions in {}", path.display()));
    for extension in &extensions {
        println!("  {}", extension);
    }
    Ok(())
}
