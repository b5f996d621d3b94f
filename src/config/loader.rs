//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (platform config dir, `config.toml`)
//! 3. Project config (`./runesmith.toml`)
//! 4. Explicit `--config` file (TOML, or YAML by extension)
//! 5. Environment variables (`RUNESMITH_*`, `__` for nesting)
//! 6. CLI overrides

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::{Config, ConfigFormat};
use crate::types::{DocType, Result, RunesmithError};

const PROJECT_CONFIG_FILE: &str = "runesmith.toml";
const GLOBAL_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "RUNESMITH_";

/// Values given on the command line; `None` leaves lower layers untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_types: Option<Vec<DocType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

/// File layers to merge, lowest priority first
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub global: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub explicit: Option<PathBuf>,
}

impl ConfigSources {
    /// Standard locations plus an optional explicit file
    pub fn standard(explicit: Option<PathBuf>) -> Self {
        Self {
            global: ConfigLoader::global_config_path(),
            project: Some(ConfigLoader::project_config_path()),
            explicit,
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain and validate it
    pub fn load(explicit: Option<&Path>, overrides: &CliOverrides) -> Result<Config> {
        Self::load_from(
            &ConfigSources::standard(explicit.map(Path::to_path_buf)),
            overrides,
        )
    }

    pub fn load_from(sources: &ConfigSources, overrides: &CliOverrides) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = &sources.global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(project_path) = &sources.project
            && project_path.exists()
        {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(project_path));
        }

        if let Some(explicit) = &sources.explicit {
            if !explicit.is_file() {
                return Err(RunesmithError::Config(format!(
                    "Config file not found: {}",
                    explicit.display()
                )));
            }
            debug!("Loading config from: {}", explicit.display());
            figment = if is_yaml(explicit) {
                figment.merge(Yaml::file(explicit))
            } else {
                figment.merge(Toml::file(explicit))
            };
        }

        // e.g. RUNESMITH_LLM__TEMPERATURE -> llm.temperature
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment = figment.merge(Serialized::defaults(overrides));

        let config: Config = figment
            .extract()
            .map_err(|e| RunesmithError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (platform specific)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "runesmith").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
    }

    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Configuration file locations and whether each exists
    pub fn paths() -> Vec<(&'static str, Option<PathBuf>)> {
        vec![
            ("Global", Self::global_config_path()),
            ("Project", Some(Self::project_config_path())),
        ]
    }

    /// Render the effective configuration
    pub fn render(config: &Config, format: ConfigFormat) -> Result<String> {
        Ok(match format {
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        })
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the commented default configuration; returns the written path
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let path = if global {
            Self::global_config_path().ok_or_else(|| {
                RunesmithError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_config_path()
        };
        Self::init_at(&path, force)
    }

    pub fn init_at(path: &Path, force: bool) -> Result<PathBuf> {
        if path.exists() && !force {
            return Err(RunesmithError::Config(format!(
                "Config already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, Self::default_config())?;
        info!("Created config: {}", path.display());
        Ok(path.to_path_buf())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_config() -> String {
        r#"# runesmith configuration
# Environment variables override this file: RUNESMITH_MODEL, RUNESMITH_LLM__TEMPERATURE, ...

provider = "openai"        # openai | azureopenai | anthropic | google | ollama
model = "gpt-4.1"
code_path = "."
output_dir = "docs"
blacklist = [".lock", ".svg", ".png"]
doc_types = ["Readme"]
custom_instructions = ""

[llm]
temperature = 0.0
timeout_secs = 300
max_tokens = 4096
max_retries = 0
# context_window = 128000

[pipeline]
summary_concurrency = 4
merge_concurrency = 2
cache_dir = "cache_docs"

# API keys default to OPENAI_API_KEY, AZURE_OPENAI_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY
# [providers.azureopenai]
# api_base = "https://my-resource.openai.azure.com"
# api_version = "2024-02-01"
"#
        .to_string()
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
