//! Custom error types for litexport.
//!
//! Every fallible library function returns `Result<T, ExportError>`.
//! An empty result set is not an error; see [`crate::pipeline::PipelineOutcome`].

use thiserror::Error;

/// Main error type for litexport operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration error (missing API key, bad base URL, client setup)
    #[error("Config error: {0}")]
    Config(String),

    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx HTTP response
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the server
        body: String,
    },

    /// 2xx response whose body carries an error marker
    #[error("API error: {0}")]
    Api(String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// True for errors raised before any network call was attempted.
    pub fn is_config(&self) -> bool {
        matches!(self, ExportError::Config(_))
    }

    /// Stage the error belongs to, for user-facing reports.
    pub fn category(&self) -> &'static str {
        match self {
            ExportError::Config(_) => "Configuration error",
            ExportError::Network(_)
            | ExportError::Http { .. }
            | ExportError::Api(_)
            | ExportError::Parse(_)
            | ExportError::Json(_) => "Error fetching articles",
            ExportError::Io(_) | ExportError::Csv(_) => "Error writing results",
        }
    }
}

/// Result type alias using `ExportError`
pub type Result<T> = std::result::Result<T, ExportError>;
