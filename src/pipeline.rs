//! Fetch, normalize, summarize, persist, plot.
//!
//! A run is driven entirely by its [`PipelineConfig`]. Configuration
//! problems surface before any request is sent; an empty result set is a
//! normal outcome, not an error.

use crate::chart;
use crate::config::{PipelineConfig, Source};
use crate::crossref::CrossrefClient;
use crate::error::Result;
use crate::export;
use crate::record::ResultSet;
use crate::springer::{SpringerClient, StopReason};
use crate::summary::{summarize, Summary};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source: Source,
    pub term: String,
    /// Records written to the CSV
    pub total: usize,
    /// Records dropped by the dedup policy
    pub duplicates_removed: usize,
    pub pages_requested: usize,
    /// Set for paginated sources
    pub stop: Option<StopReason>,
    pub summary: Summary,
    pub csv_path: PathBuf,
    pub chart_rendered: bool,
    /// Plotting failure, caught after the CSV was written
    pub chart_error: Option<String>,
}

/// Terminal state of a run that did not fail.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Nothing came back; nothing was written
    NoRecords { source: Source, term: String },
    Completed(RunReport),
}

struct Fetched {
    records: ResultSet,
    pages_requested: usize,
    stop: Option<StopReason>,
}

/// Run the pipeline, writing console output to `out`.
pub async fn run<W: Write>(config: &PipelineConfig, out: &mut W) -> Result<PipelineOutcome> {
    let source = config.source;
    let term = config.query.term.clone();

    let mut fetched = fetch(config).await?;

    let duplicates_removed = fetched.records.dedup(config.dedup);
    if duplicates_removed > 0 {
        info!(removed = duplicates_removed, policy = ?config.dedup, "Removed duplicate records");
    }

    let records = fetched.records;
    let summary = summarize(&records);

    if records.is_empty() {
        writeln!(out, "{}", summary)?;
        info!(source = %source, term = %term, "No records, skipping export");
        return Ok(PipelineOutcome::NoRecords { source, term });
    }

    writeln!(out, "Found {} records from {}.", records.len(), source.label())?;
    write_preview(out, &records, config.preview)?;
    writeln!(out, "{}", summary)?;

    let csv_path = export::csv_path(&config.output_dir, source, &term);
    export::write_csv(&csv_path, &records)?;
    // Console failures past this point must not discard the written CSV.
    if let Err(e) = writeln!(out, "Saved {} records to {}", records.len(), csv_path.display()) {
        warn!(error = %e, "Could not write save notice");
    }

    let mut chart_rendered = false;
    let mut chart_error = None;
    if config.plot {
        let title = format!(
            "Publication Year Distribution ({}) for '{}'",
            source.label(),
            term
        );
        match render_chart(out, &title, &records) {
            Ok(true) => chart_rendered = true,
            Ok(false) => debug!("No year data, chart skipped"),
            Err(e) => {
                warn!(error = %e, "Plotting failed");
                chart_error = Some(e.to_string());
            }
        }
    }

    Ok(PipelineOutcome::Completed(RunReport {
        source,
        term,
        total: records.len(),
        duplicates_removed,
        pages_requested: fetched.pages_requested,
        stop: fetched.stop,
        summary,
        csv_path,
        chart_rendered,
        chart_error,
    }))
}

async fn fetch(config: &PipelineConfig) -> Result<Fetched> {
    match config.source {
        Source::Crossref => {
            let endpoint = config.source.endpoint(config.base_url.as_deref())?;
            let client = CrossrefClient::new(endpoint, &config.limits)?;
            let records = client.fetch(&config.query).await?;
            Ok(Fetched {
                records,
                pages_requested: 1,
                stop: None,
            })
        }
        Source::Springer => {
            let api_key = config.query.require_api_key()?;
            let endpoint = config.source.endpoint(config.base_url.as_deref())?;
            let client = SpringerClient::new(endpoint, api_key, &config.limits)?;
            let report = client.fetch(&config.query).await?;
            Ok(Fetched {
                records: report.records,
                pages_requested: report.pages_requested,
                stop: Some(report.stop),
            })
        }
    }
}

/// Separator line plus the year chart; any write failure is the chart's.
fn render_chart<W: Write>(out: &mut W, title: &str, records: &ResultSet) -> Result<bool> {
    writeln!(out)?;
    chart::plot_years(out, title, records)
}

fn write_preview<W: Write>(out: &mut W, records: &ResultSet, limit: usize) -> Result<()> {
    if limit == 0 {
        return Ok(());
    }

    writeln!(out, "Preview of results:")?;
    for (i, record) in records.iter().take(limit).enumerate() {
        let year = if record.year.is_empty() { "----" } else { record.year.as_str() };
        let publication = if record.publication.is_empty() {
            "(no journal)"
        } else {
            record.publication.as_str()
        };
        writeln!(out, "{:>3}. [{}] {} | {}", i + 1, year, record.title, publication)?;
    }
    writeln!(out)?;
    Ok(())
}
