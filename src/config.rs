//! Run configuration.
//!
//! Everything a pipeline run needs is resolved up front into a
//! [`PipelineConfig`] and passed to [`crate::pipeline::run`]. Nothing here
//! reads process-wide state; the CLI is responsible for pulling
//! `SPRINGER_API_KEY` from the environment.

use crate::error::{ExportError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Crossref works endpoint
pub const CROSSREF_API_URL: &str = "https://api.crossref.org/works";

/// Springer Nature Open Access JSON endpoint
pub const SPRINGER_API_URL: &str = "https://api.springernature.com/openaccess/json";

/// Environment variable holding the Springer Nature API key
pub const SPRINGER_API_KEY_ENV: &str = "SPRINGER_API_KEY";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("litexport/", env!("CARGO_PKG_VERSION"));

/// Default rows for a single Crossref request
pub const DEFAULT_CROSSREF_ROWS: usize = 100;

/// Default Springer page size
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default Springer record cap
pub const DEFAULT_MAX_RECORDS: usize = 200;

/// Default hard cap on paginated requests
pub const DEFAULT_MAX_PAGES: usize = 20;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Data source a run queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Crossref,
    Springer,
}

impl Source {
    /// Short name, used as the CSV filename prefix
    pub fn name(&self) -> &'static str {
        match self {
            Source::Crossref => "crossref",
            Source::Springer => "springer",
        }
    }

    /// Human-readable name for console output
    pub fn label(&self) -> &'static str {
        match self {
            Source::Crossref => "Crossref",
            Source::Springer => "Springer Nature",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Source::Crossref => CROSSREF_API_URL,
            Source::Springer => SPRINGER_API_URL,
        }
    }

    /// Resolve the endpoint, validating an override if one is given.
    pub fn endpoint(&self, base_url: Option<&str>) -> Result<Url> {
        let raw = base_url.unwrap_or(self.default_base_url());
        let url = Url::parse(raw)
            .map_err(|e| ExportError::Config(format!("Invalid base URL '{}': {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ExportError::Config(format!(
                "Unsupported URL scheme '{}' in '{}'",
                other, raw
            ))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do with records repeated across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// Keep every record as returned, duplicates included
    #[default]
    None,
    /// Keep the first record for each non-empty URL
    ByUrl,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DedupPolicy::None),
            "url" | "by-url" => Ok(DedupPolicy::ByUrl),
            other => Err(format!("unknown dedup policy '{}' (expected none|url)", other)),
        }
    }
}

/// Resolved parameters for one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Search term, trimmed
    pub term: String,
    /// Records per request (`rows` for Crossref, `p` for Springer)
    pub page_size: usize,
    /// Stop paginating once this many records are accumulated
    pub max_records: usize,
    /// API key, only used by Springer
    pub api_key: Option<String>,
}

impl QuerySpec {
    /// Build a query, rejecting an empty term or zero sizes.
    pub fn new(
        term: &str,
        page_size: usize,
        max_records: usize,
        api_key: Option<String>,
    ) -> Result<Self> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ExportError::Config("Query term must not be empty".to_string()));
        }
        if page_size == 0 {
            return Err(ExportError::Config("Page size must be at least 1".to_string()));
        }
        if max_records == 0 {
            return Err(ExportError::Config("Max records must be at least 1".to_string()));
        }

        Ok(Self {
            term: term.to_string(),
            page_size,
            max_records,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Single-request Crossref query
    pub fn crossref(term: &str, rows: usize) -> Result<Self> {
        Self::new(term, rows, rows, None)
    }

    /// Paginated Springer query
    pub fn springer(
        term: &str,
        page_size: usize,
        max_records: usize,
        api_key: Option<String>,
    ) -> Result<Self> {
        Self::new(term, page_size, max_records, api_key)
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            ExportError::Config(format!(
                "{} not set. Please set it in your environment or pass --api-key.",
                SPRINGER_API_KEY_ENV
            ))
        })
    }
}

/// Safety bounds on fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Maximum number of paginated requests per run
    pub max_pages: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl FetchLimits {
    /// HTTP client carrying the per-request timeout
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ExportError::Config(format!("Failed to build HTTP client: {}", e)))
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: Source,
    pub query: QuerySpec,
    pub limits: FetchLimits,
    /// Endpoint override (mock servers, mirrors)
    pub base_url: Option<String>,
    /// Directory the CSV is written into
    pub output_dir: PathBuf,
    /// Render the year chart after persisting
    pub plot: bool,
    pub dedup: DedupPolicy,
    /// Number of records to print as a preview
    pub preview: usize,
}

impl PipelineConfig {
    pub fn new(source: Source, query: QuerySpec) -> Self {
        Self {
            source,
            query,
            limits: FetchLimits::default(),
            base_url: None,
            output_dir: PathBuf::from("."),
            plot: true,
            dedup: DedupPolicy::default(),
            preview: 5,
        }
    }
}
