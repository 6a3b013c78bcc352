//! CLI entry point for corpus-search.
//!
//! Provides commands for setting up configuration, running one-off queries
//! against a CSV corpus, and serving queries over HTTP.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use console::style;
use corpus_search::display::{create_match_table, create_spinner};
use corpus_search::io::{ExitCode, QueryResponse};
use corpus_search::{
    EmbeddingGenerator, FastEmbedGenerator, SearchError, SearchResult, SearchService, Settings,
    load_csv,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Semantic search over a fixed text corpus
#[derive(Parser)]
#[command(
    name = "corpus-search",
    version = env!("CARGO_PKG_VERSION"),
    about = "Semantic search over a fixed text corpus",
    long_about = "Embed every row of a CSV corpus once, then return the rows closest in meaning to a query.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .corpus-search directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    #[command(about = "Display active settings after file and environment overrides")]
    Config,

    /// Run one query against the corpus
    #[command(about = "Embed the corpus and print the rows nearest to TEXT")]
    Query {
        /// Query text
        text: String,

        /// Number of matches (defaults to search.default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve queries over HTTP
    #[command(about = "Start the HTTP query server (POST /query, GET /health)")]
    Serve {
        /// Bind address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Init { .. }) && cli.config.is_none() {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    let settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {e}",
                config_path.display()
            );
            std::process::exit(ExitCode::ConfigError.into());
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    init_tracing(settings.debug || cli.verbose);

    match cli.command {
        Commands::Init { force } => {
            match Settings::init_config_file(force) {
                Ok(path) => {
                    println!("Created configuration file at: {}", path.display());
                    println!("Edit this file to customize your settings.");
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(ExitCode::ConfigError.into());
                }
            }
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            match toml::to_string_pretty(&settings) {
                Ok(toml_str) => println!("{toml_str}"),
                Err(e) => eprintln!("Error displaying config: {e}"),
            }
        }

        Commands::Query { text, k, json } => {
            let code = run_query(&settings, &text, k, json).await;
            std::process::exit(code.into());
        }

        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            let code = run_server(&settings, &bind).await;
            std::process::exit(code.into());
        }
    }
}

/// Log to stderr so query output on stdout stays machine-readable.
fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the corpus and the model, then embed every record.
async fn build_service(settings: &Settings) -> SearchResult<SearchService> {
    settings.validate()?;

    let records = load_csv(&settings.corpus.path, &settings.corpus.text_column)?;

    // Model loading reads (and may download) weights; keep it off the runtime
    let embedding = settings.embedding.clone();
    let generator = tokio::task::spawn_blocking(move || FastEmbedGenerator::from_config(&embedding))
        .await
        .map_err(|e| SearchError::embedding(format!("model loading aborted: {e}")))??;
    tracing::info!(
        "Loaded embedding model {} ({}-d)",
        generator.model_name(),
        generator.dimension()
    );

    let generator: Arc<dyn EmbeddingGenerator> = Arc::new(generator);
    SearchService::from_settings(settings, records, generator).await
}

async fn build_service_with_spinner(settings: &Settings) -> SearchResult<SearchService> {
    let start = Instant::now();
    let spinner = create_spinner("Embedding corpus...");
    let result = build_service(settings).await;
    spinner.finish_and_clear();

    if let Ok(service) = &result {
        tracing::debug!(
            "Service ready with {} records ({}-d) in {:.2}s",
            service.len(),
            service.dimension(),
            start.elapsed().as_secs_f64()
        );
    }
    result
}

async fn run_query(settings: &Settings, text: &str, k: Option<usize>, json: bool) -> ExitCode {
    let service = match build_service_with_spinner(settings).await {
        Ok(service) => service,
        Err(e) => return report_error(&e),
    };

    let k = k.unwrap_or_else(|| service.default_k());
    let matches = match service.query(text, k).await {
        Ok(matches) => matches,
        Err(e) => return report_error(&e),
    };

    if json {
        match serde_json::to_string_pretty(&QueryResponse::from_matches(&matches)) {
            Ok(body) => println!("{body}"),
            Err(e) => {
                eprintln!("Error serializing results: {e}");
                return ExitCode::GeneralError;
            }
        }
    } else if matches.is_empty() {
        println!("No matches (corpus has {} records)", service.len());
    } else {
        println!("{}", create_match_table(&matches));
    }

    ExitCode::from_match_count(matches.len())
}

#[cfg(feature = "http-server")]
async fn run_server(settings: &Settings, bind: &str) -> ExitCode {
    let service = match build_service_with_spinner(settings).await {
        Ok(service) => service,
        Err(e) => return report_error(&e),
    };

    match corpus_search::server::serve(Arc::new(service), bind).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("{} {e}", style("Server error:").red().bold());
            ExitCode::GeneralError
        }
    }
}

#[cfg(not(feature = "http-server"))]
async fn run_server(_settings: &Settings, _bind: &str) -> ExitCode {
    eprintln!("HTTP server support is not compiled in.");
    eprintln!("Rebuild with: cargo build --features http-server");
    ExitCode::GeneralError
}

fn report_error(error: &SearchError) -> ExitCode {
    let code = ExitCode::from_error(error);
    eprintln!("{} {error}", style("Error:").red().bold());
    if code.is_blocking() {
        eprintln!("The search service could not start.");
    }
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        eprintln!();
        eprintln!("{}", style("Suggestions:").cyan());
        for suggestion in suggestions {
            eprintln!("  - {suggestion}");
        }
    }
    tracing::debug!("Exiting with code {} ({})", i32::from(code), code.description());
    code
}
