use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use runesmith::cli::commands::generate::GenerateOptions;
use runesmith::config::{CliOverrides, ConfigFormat};
use runesmith::types::DocType;

#[derive(Parser)]
#[command(name = "runesmith")]
#[command(
    version,
    about = "Generate codebase documentation by summarizing every file and merging the summaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (TOML, or YAML by extension)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documentation for a code tree
    Generate {
        #[arg(long, help = "LLM provider (openai, azureopenai, anthropic, google, ollama)")]
        provider: Option<String>,
        #[arg(long, short, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Root of the code tree")]
        code_path: Option<PathBuf>,
        #[arg(long, short, help = "Output directory")]
        output: Option<PathBuf>,
        #[arg(
            long = "doc-type",
            short = 'd',
            help = "Documentation type to generate (repeatable)"
        )]
        doc_types: Vec<String>,
        #[arg(long, help = "Extra instructions appended to every document prompt")]
        instructions: Option<String>,
        #[arg(long = "dry-run", help = "Show configuration and scan preview only")]
        dry_run: bool,
    },

    /// List file extensions present under a directory
    Extensions {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List known models and their context windows
    Models {
        #[arg(long, short, help = "Only this provider")]
        provider: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mrunesmith encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            provider,
            model,
            code_path,
            output,
            doc_types,
            instructions,
            dry_run,
        } => {
            let doc_types = (!doc_types.is_empty())
                .then(|| doc_types.into_iter().map(DocType::from).collect());

            let success = runesmith::cli::commands::generate::run(GenerateOptions {
                config: cli.config,
                overrides: CliOverrides {
                    provider,
                    model,
                    code_path,
                    output_dir: output,
                    doc_types,
                    custom_instructions: instructions,
                },
                dry_run,
            })?;

            if !success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Extensions { path } => {
            runesmith::cli::commands::extensions::run(&path)?;
        }
        Commands::Models { provider } => {
            runesmith::cli::commands::models::run(provider.as_deref(), cli.config.as_deref())?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                runesmith::cli::commands::config::show(cli.config.as_deref(), format)?;
            }
            ConfigAction::Path => {
                runesmith::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                runesmith::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
