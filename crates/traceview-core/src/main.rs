//! TraceView CLI
//!
//! Command-line interface for reviewing and annotating LLM traces.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use traceview::config::LoggingConfig;
use traceview::loader::{load_traces, TraceSource};
use traceview::render::html::export_document;
use traceview::render::sanitize_terminal;
use traceview::store::open_annotation_store;
use traceview::tui::App;
use traceview::Config;

/// TraceView - Review and annotate LLM conversation traces
#[derive(Parser)]
#[command(name = "traceview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TRACEVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Step through traces in the terminal and annotate them
    Review {
        /// Trace file or http(s) URL (defaults to viewer.source)
        source: Option<String>,
    },

    /// Export traces with their annotations as a standalone HTML page
    Export {
        /// Trace file or http(s) URL (defaults to viewer.source)
        source: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show review progress
    Status {
        /// Trace file or http(s) URL (defaults to viewer.source)
        source: Option<String>,
    },
}

#[derive(Serialize)]
struct TraceStatus<'a> {
    id: &'a str,
    reviewed: bool,
    annotation: String,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    source: String,
    total: usize,
    reviewed: usize,
    traces: Vec<TraceStatus<'a>>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments; `.env` first so it can supply TRACEVIEW_CONFIG
    let cli = match parse_cli(None, std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The TUI owns the terminal, so it logs to a file
    let to_file = matches!(cli.command, Commands::Review { .. });
    let _guard = match init_logging(&config.logging, cli.verbose, to_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Review { source } => run_review(&config, source.as_deref()).await,
        Commands::Export { source, output } => {
            run_export(&config, source.as_deref(), output.as_deref()).await
        }
        Commands::Status { source } => run_status(&config, source.as_deref(), cli.format).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn parse_cli<I, T>(env_file: Option<&Path>, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    if let Some(path) = env_file {
        dotenvy::from_path(path).ok();
    } else {
        dotenvy::dotenv().ok();
    }
    Cli::try_parse_from(args)
}

fn init_logging(
    logging: &LoggingConfig,
    verbose: bool,
    to_file: bool,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = logging.format.eq_ignore_ascii_case("json");

    if to_file {
        let path = logging.resolved_file();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
        let file_name = path.file_name().map_or_else(
            || "traceview.log".into(),
            std::ffi::OsStr::to_os_string,
        );
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        if json {
            tracing_subscriber::registry().with(filter).with(layer.json()).init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        return Ok(Some(guard));
    }

    let layer = fmt::layer().with_writer(std::io::stderr);
    if json {
        tracing_subscriber::registry().with(filter).with(layer.json()).init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
    Ok(None)
}

fn resolve_source(config: &Config, source: Option<&str>) -> TraceSource {
    TraceSource::parse(source.unwrap_or(&config.viewer.source))
}

async fn run_review(config: &Config, source: Option<&str>) -> anyhow::Result<()> {
    let source = resolve_source(config, source);
    info!(source = %source, "starting review");

    let store = open_annotation_store(&config.storage);
    let mut app = App::new(&source, store, config);
    app.run(&source).await?;

    info!("review finished");
    Ok(())
}

async fn run_export(
    config: &Config,
    source: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let source = resolve_source(config, source);
    let traces = load_traces(&source).await?;
    let store = open_annotation_store(&config.storage);

    let document = export_document(&traces, config.viewer.unknown_roles, |id| store.get(id));

    match output {
        Some(path) => {
            std::fs::write(path, document)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), traces = traces.len(), "exported review");
        }
        None => print!("{document}"),
    }
    Ok(())
}

async fn run_status(
    config: &Config,
    source: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let source = resolve_source(config, source);
    let traces = load_traces(&source).await?;
    let store = open_annotation_store(&config.storage);

    let entries: Vec<TraceStatus<'_>> = traces
        .iter()
        .map(|trace| {
            let annotation = store.get(&trace.id);
            TraceStatus {
                id: &trace.id,
                reviewed: !annotation.trim().is_empty(),
                annotation,
            }
        })
        .collect();
    let report = StatusReport {
        source: source.to_string(),
        total: entries.len(),
        reviewed: entries.iter().filter(|entry| entry.reviewed).count(),
        traces: entries,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("{}", report.source);
            println!("{} / {} reviewed", report.reviewed, report.total);
            println!();
            for entry in &report.traces {
                println!("{}", status_line(entry));
            }
        }
    }
    Ok(())
}

fn status_line(entry: &TraceStatus<'_>) -> String {
    let mark = if entry.reviewed { "✓" } else { " " };
    let first_line = entry.annotation.lines().next().unwrap_or_default();
    format!(
        "  [{mark}] {}  {}",
        sanitize_terminal(entry.id),
        truncate(&sanitize_terminal(first_line), 60)
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
