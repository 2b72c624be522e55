//! fieldscrape main entry point
//!
//! This is the command-line interface for the fieldscrape extraction engine.
//! Every command prints JSON to stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use fieldscrape::config::{load_config, load_request, EngineConfig};
use fieldscrape::ScrapingEngine;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// fieldscrape: schema-driven web page extraction
///
/// Fetches pages over plain HTTP or a headless browser, extracts records
/// described by a field schema and prints them as JSON.
#[derive(Parser, Debug)]
#[command(name = "fieldscrape")]
#[command(version = "1.0.0")]
#[command(about = "Schema-driven web page extraction", long_about = None)]
struct Cli {
    /// Path to TOML engine configuration (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scrape request described in a TOML file
    Scrape {
        #[arg(value_name = "REQUEST")]
        request: PathBuf,
    },

    /// Scrape a URL with the schema of a preset
    ScrapePreset {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(value_name = "URL")]
        url: String,
    },

    /// Classify a page as static or dynamic
    Detect {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// List presets, optionally only one category
    Presets {
        #[arg(long)]
        category: Option<String>,
    },

    /// List preset categories
    Categories,

    /// Show one preset in full
    Preset {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Suggest presets for a URL
    Suggest {
        #[arg(value_name = "URL")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?
        }
        None => EngineConfig::default(),
    };

    let engine = ScrapingEngine::new(config)?;
    let exit = run_command(&engine, cli.command).await;
    engine.shutdown().await;

    exit
}

async fn run_command(
    engine: &ScrapingEngine,
    command: Command,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::Scrape { request } => {
            let request = load_request(&request)?;
            let outcome = engine.scrape(&request).await;
            print_json(&outcome)?;
            Ok(exit_code(outcome.is_success()))
        }
        Command::ScrapePreset { id, url } => {
            let Some(preset) = engine.preset(&id) else {
                return Err(format!("Unknown preset: {}", id).into());
            };
            let outcome = engine.scrape(&preset.request_for(url)).await;
            print_json(&outcome)?;
            Ok(exit_code(outcome.is_success()))
        }
        Command::Detect { url } => {
            print_json(&engine.detect_page_type(&url).await)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Presets { category } => {
            print_json(&engine.presets(category.as_deref()))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Categories => {
            print_json(engine.categories())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Preset { id } => match engine.preset(&id) {
            Some(preset) => {
                print_json(preset)?;
                Ok(ExitCode::SUCCESS)
            }
            None => Err(format!("Unknown preset: {}", id).into()),
        },
        Command::Suggest { url } => {
            print_json(&engine.suggest_presets(&url))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fieldscrape=info,warn"),
            1 => EnvFilter::new("fieldscrape=debug,info"),
            2 => EnvFilter::new("fieldscrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
