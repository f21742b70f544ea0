//! CLI entry point for the embedding searcher.
//!
//! Provides commands for inspecting pre-built indices and running
//! nearest-neighbor queries with precomputed embeddings.

use anyhow::{Context, anyhow};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use embedsearch::io::{ExitCode, IndexInfo, OutputFormat, OutputManager, SearchReport};
use embedsearch::searcher::{check_max_results, metadata_filter};
use embedsearch::{
    Embedding, IndexStore, SearchError, SearchRequest, Settings, SimilaritySearchEngine,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Embedding nearest-neighbor search
#[derive(Parser)]
#[command(
    name = "embedsearch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Nearest-neighbor search over pre-built embedding indices",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .embedsearch directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .embedsearch/settings.toml")]
    Config,

    /// Describe an index file
    #[command(about = "Show dimension, record count, metric and user info of an index")]
    Info {
        /// Index file (overrides `index_path` from settings)
        #[arg(long)]
        index: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Find the nearest neighbors of an embedding
    #[command(
        about = "Rank index records against a precomputed query embedding",
        after_help = "Examples:\n  embedsearch search --index data/index.ldb --query query.json -k 3\n  echo '[0.1, 0.2, 0.3]' | embedsearch search --query - --deny cat\n\nJSON paths:\n  search   .data.nearest_neighbors[].metadata"
    )]
    Search {
        /// Index file (overrides `index_path` from settings)
        #[arg(long)]
        index: Option<PathBuf>,

        /// JSON array of numbers holding the query embedding, `-` for stdin
        #[arg(short, long)]
        query: PathBuf,

        /// Number of neighbors to return (overrides config)
        #[arg(short = 'k', long)]
        max_results: Option<usize>,

        /// Only return records with this metadata (repeatable)
        #[arg(long)]
        allow: Vec<String>,

        /// Never return records with this metadata (repeatable)
        #[arg(long)]
        deny: Vec<String>,

        /// L2-normalize the query before searching
        #[arg(long)]
        normalize: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(config_path) => match Settings::load_from(config_path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!(
                    "Configuration error loading from {}: {e}",
                    config_path.display()
                );
                return ExitCode::ConfigError.into();
            }
        },
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };

    init_tracing(cli.verbose, &settings.logging.level);

    match run(cli.command, settings) {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::GeneralError.into()
        }
    }
}

/// `--verbose` wins over `RUST_LOG`, which wins over the configured level.
fn init_tracing(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, settings: Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            Ok(ExitCode::Success)
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            let toml_str =
                toml::to_string_pretty(&settings).context("Error displaying config")?;
            println!("{toml_str}");
            Ok(ExitCode::Success)
        }

        Commands::Info { index, json } => {
            let mut output = OutputManager::new(OutputFormat::from_json_flag(json));
            let started = Instant::now();
            let code = match index_info(index, &settings) {
                Ok(info) => output.success(info, Some(started.elapsed()))?,
                Err(e) => output.error(&e)?,
            };
            Ok(code)
        }

        Commands::Search {
            index,
            query,
            max_results,
            allow,
            deny,
            normalize,
            json,
        } => {
            let mut output = OutputManager::new(OutputFormat::from_json_flag(json));
            let args = SearchArgs {
                index,
                query,
                max_results,
                allow,
                deny,
                normalize,
            };

            let started = Instant::now();
            let code = match search(args, &settings) {
                Ok(report) if report.result.is_empty() => output.not_found("Neighbor", "any")?,
                Ok(report) => output.success(report, Some(started.elapsed()))?,
                Err(e) => output.error(&e)?,
            };
            Ok(code)
        }
    }
}

struct SearchArgs {
    index: Option<PathBuf>,
    query: PathBuf,
    max_results: Option<usize>,
    allow: Vec<String>,
    deny: Vec<String>,
    normalize: bool,
}

fn resolve_index(index: Option<PathBuf>, settings: &Settings) -> Result<PathBuf, SearchError> {
    index
        .or_else(|| settings.index_path.clone())
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| {
            SearchError::invalid_argument(
                "Missing mandatory `index_file` field in `search_options`",
            )
        })
}

fn index_info(index: Option<PathBuf>, settings: &Settings) -> Result<IndexInfo, SearchError> {
    let path = resolve_index(index, settings)?;
    let store = IndexStore::load(&path)?;
    Ok(IndexInfo::new(path, &store))
}

/// Same checks and order as searcher construction, minus the model.
fn search(args: SearchArgs, settings: &Settings) -> Result<SearchReport, SearchError> {
    let index = resolve_index(args.index, settings)?;
    if settings.embedding.quantize {
        return Err(SearchError::invalid_argument(
            "Setting EmbeddingOptions.quantize = true is not allowed in searchers.",
        ));
    }

    let allow = if args.allow.is_empty() {
        settings.search.metadata_allowlist.clone()
    } else {
        args.allow
    };
    let deny = if args.deny.is_empty() {
        settings.search.metadata_denylist.clone()
    } else {
        args.deny
    };
    let filter = metadata_filter(allow, deny)?;

    let max_results = args.max_results.unwrap_or(settings.search.max_results);
    check_max_results(max_results)?;

    let store = IndexStore::load(&index)?;
    let mut query = read_query(&args.query)?;
    if args.normalize || settings.embedding.l2_normalize {
        query = query.l2_normalized();
    }

    let engine = SimilaritySearchEngine::new(store);
    let request = SearchRequest::new(max_results).with_filter(&filter);
    let result = engine.search_with(query.as_slice(), &request)?;

    Ok(SearchReport {
        index,
        max_results,
        result,
    })
}

fn read_query(path: &Path) -> Result<Embedding, SearchError> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(|e| {
            SearchError::invalid_argument(format!("Failed to read query from stdin: {e}"))
        })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            SearchError::invalid_argument(format!(
                "Failed to read query file '{}': {e}",
                path.display()
            ))
        })?
    };

    let values: Vec<f32> = serde_json::from_str(&raw).map_err(|e| {
        SearchError::invalid_argument(format!("Query must be a JSON array of numbers: {e}"))
    })?;
    Embedding::new(values)
}
