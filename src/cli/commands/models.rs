//! Models Command
//!
//! Lists registered models with their context windows. For Ollama the local
//! server is asked for its installed models instead.

use std::path::Path;

use crate::ai::models::ModelRegistry;
use crate::ai::provider::ProviderKind;
use crate::cli::Output;
use crate::types::Result;

pub fn run(provider: Option<&str>, config: Option<&Path>) -> Result<()> {
    let kinds = match provider {
        Some(key) => vec![key.parse::<ProviderKind>()?],
        None => ProviderKind::ALL.to_vec(),
    };

    let registry = ModelRegistry::builtin();
    let out = Output::new();

    for kind in kinds {
        out.section(kind.key());

        if kind == ProviderKind::Ollama {
            list_ollama(&out, provider.is_some(), config)?;
            continue;
        }

        for spec in registry.models_for(kind) {
            println!("  {:<34} {:>10} tokens", spec.model, spec.context_window);
        }
    }
    Ok(())
}

#[cfg(feature = "ollama")]
fn list_ollama(out: &Output, selected: bool, config: Option<&Path>) -> Result<()> {
    use crate::ai::provider::OllamaProvider;
    use crate::config::{CliOverrides, ConfigLoader};
    use tokio::runtime::Runtime;

    if !selected {
        out.info("Installed models are listed with --provider ollama");
        return Ok(());
    }

    let config = ConfigLoader::load(config, &CliOverrides::default())?;
    let ollama = OllamaProvider::new(&config.provider_config(ProviderKind::Ollama))?;
    let models = Runtime::new()?.block_on(ollama.list_models())?;

    if models.is_empty() {
        out.warning("No models installed. Pull one with: ollama pull <model>");
    }
    for model in models {
        println!("  {}", model);
    }
    Ok(())
}

#[cfg(not(feature = "ollama"))]
fn list_ollama(out: &Output, _selected: bool, _config: Option<&Path>) -> Result<()> {
    out.warning("Built without the 'ollama' feature");
    Ok(())
}
