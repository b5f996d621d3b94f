//! Config Command
//!
//! Inspect and scaffold runesmith configuration.
//!
//! Usage:
//!   runesmith config show [-f toml|json|yaml]
//!   runesmith config path
//!   runesmith config init [-g] [--force]

use std::path::Path;

use crate::cli::Output;
use crate::config::{CliOverrides, ConfigFormat, ConfigLoader};
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(explicit: Option<&Path>, format: ConfigFormat) -> Result<()> {
    let config = ConfigLoader::load(explicit, &CliOverrides::default())?;
    println!("{}", ConfigLoader::render(&config, format)?);
    Ok(())
}

/// Show configuration file paths
pub fn path() -> Result<()> {
    let out = Output::new();
    out.section("Configuration files");
    for (label, path) in ConfigLoader::paths() {
        match path {
            Some(path) => {
                let status = if path.exists() { "" } else { " (not found)" };
                out.field(label, format!("{}{}", path.display(), status));
            }
            None => out.field(label, "(unavailable on this platform)"),
        }
    }
    Ok(())
}

/// Write the default configuration file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = ConfigLoader::init(global, force)?;
    Output::new().success(&format!("Created {}", path.display()));
    Ok(())
}
