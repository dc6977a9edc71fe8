//! litexport - Crossref / Springer Nature literature export
//!
//! Queries a scholarly API, prints a short summary, writes the results to
//! `<source>_<term>.csv` and draws a publication-year chart.
//!
//! ## Usage
//!
//! ```bash
//! litexport crossref "machine learning" --rows 100
//! SPRINGER_API_KEY=... litexport springer "graph neural networks" --max-records 200
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use litexport::config::{
    DedupPolicy, FetchLimits, PipelineConfig, QuerySpec, Source, DEFAULT_CROSSREF_ROWS,
    DEFAULT_MAX_PAGES, DEFAULT_MAX_RECORDS, DEFAULT_PAGE_SIZE, SPRINGER_API_KEY_ENV,
};
use litexport::pipeline::{self, PipelineOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Crossref / Springer Nature literature export
#[derive(Parser)]
#[command(name = "litexport")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search Crossref works (single request)
    Crossref {
        /// Search term
        term: String,

        /// Number of rows to request
        #[arg(long, default_value_t = DEFAULT_CROSSREF_ROWS)]
        rows: usize,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Search Springer Nature Open Access (paginated)
    Springer {
        /// Search term
        term: String,

        /// Records per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// Stop once this many records are collected
        #[arg(long, default_value_t = DEFAULT_MAX_RECORDS)]
        max_records: usize,

        /// Hard cap on page requests
        #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: usize,

        /// Springer Nature API key
        #[arg(long, env = SPRINGER_API_KEY_ENV, hide_env_values = true)]
        api_key: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Skip the year distribution chart
    #[arg(long)]
    no_plot: bool,

    /// Duplicate handling: none or url
    #[arg(long, default_value = "none")]
    dedup: DedupPolicy,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Override the API endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Number of records to preview
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = build_config(cli.command).context("Configuration error")?;
    run(config).await
}

/// Turn parsed arguments into a pipeline configuration
fn build_config(command: Commands) -> Result<PipelineConfig> {
    let (source, query, max_pages, common) = match command {
        Commands::Crossref { term, rows, common } => {
            (Source::Crossref, QuerySpec::crossref(&term, rows)?, 1, common)
        }
        Commands::Springer {
            term,
            page_size,
            max_records,
            max_pages,
            api_key,
            common,
        } => {
            anyhow::ensure!(max_pages > 0, "--max-pages must be at least 1");
            let query = QuerySpec::springer(&term, page_size, max_records, api_key)?;
            (Source::Springer, query, max_pages, common)
        }
    };

    anyhow::ensure!(common.timeout > 0, "--timeout must be at least 1 second");

    let mut config = PipelineConfig::new(source, query);
    config.limits = FetchLimits {
        max_pages,
        request_timeout: Duration::from_secs(common.timeout),
    };
    config.base_url = common.base_url;
    config.output_dir = common.output;
    config.plot = !common.no_plot;
    config.dedup = common.dedup;
    config.preview = common.preview;
    Ok(config)
}

// ============================================================================
// Pipeline
// ============================================================================

async fn run(config: PipelineConfig) -> Result<()> {
    println!(
        "Searching {} for: '{}'",
        config.source.label(),
        config.query.term
    );

    let mut stdout = std::io::stdout();
    match pipeline::run(&config, &mut stdout).await {
        Ok(PipelineOutcome::NoRecords { source, term }) => {
            info!(source = %source, term = %term, "Run finished without records");
            Ok(())
        }
        Ok(PipelineOutcome::Completed(report)) => {
            if let Some(e) = &report.chart_error {
                println!("Error plotting results: {}", e);
            }
            info!(
                source = %report.source,
                total = report.total,
                pages = report.pages_requested,
                path = %report.csv_path.display(),
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            let context = e.category();
            Err(e).context(context)
        }
    }
}
