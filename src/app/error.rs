use thiserror::Error;

use crate::config::ConfigError;
use crate::merge::MergeReport;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out after {timeout_ms}ms waiting for {selector}")]
    WaitTimeout { selector: String, timeout_ms: u64 },

    #[error("Browser session unusable: {0}")]
    SessionFatal(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Staging error: {0}")]
    Staging(#[from] csv::Error),

    #[error("Staging artifact already closed: {0}")]
    StagingClosed(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed staged row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Page-level failures: the page is skipped and the crawl continues.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Navigation { .. } | Self::WaitTimeout { .. })
    }

    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::SessionFatal(_))
    }

    /// Failures of the staging artifact itself, as opposed to one bad row.
    pub fn is_staging(&self) -> bool {
        matches!(self, Self::Staging(_) | Self::StagingClosed(_))
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A merge that stopped early. Rows counted in `partial` were already
/// committed and stay in the store.
#[derive(Error, Debug)]
#[error("Merge aborted after {} rows: {cause}", .partial.processed)]
pub struct MergeFailure {
    pub partial: MergeReport,
    #[source]
    pub cause: PipelineError,
}
