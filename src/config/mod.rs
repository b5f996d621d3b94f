//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (platform config dir)
//! 3. Project config (./runesmith.toml)
//! 4. Explicit config file (--config)
//! 5. Environment variables (RUNESMITH_*)
//! 6. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::{CliOverrides, ConfigLoader, ConfigSources};
pub use types::*;
