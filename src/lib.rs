//! # litexport
//!
//! Literature export pipeline for the Crossref and Springer Nature Open Access APIs.
//!
//! ## Modules
//!
//! - [`config`] - Query, limits and run configuration
//! - [`crossref`] - Crossref works search (single request)
//! - [`springer`] - Springer Nature Open Access search (paginated)
//! - [`record`] - Canonical record and result set
//! - [`summary`] - Top year / top journal statistics
//! - [`export`] - CSV persistence
//! - [`chart`] - Year distribution bar chart
//! - [`pipeline`] - End-to-end run
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use litexport::config::{PipelineConfig, QuerySpec, Source};
//! use litexport::pipeline::{self, PipelineOutcome};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let query = QuerySpec::crossref("machine learning", 100)?;
//!     let config = PipelineConfig::new(Source::Crossref, query);
//!     if let PipelineOutcome::Completed(report) =
//!         pipeline::run(&config, &mut std::io::stdout()).await?
//!     {
//!         println!("Wrote {}", report.csv_path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod chart;
pub mod config;
pub mod crossref;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod record;
pub mod springer;
pub mod summary;

pub use error::{ExportError, Result};
pub use record::{Record, ResultSet};
