//! Output module for end-of-run reporting
//!
//! This module handles:
//! - Writing `summary.txt` (downloaded versus external resources)
//! - Recording per-run statistics and logging them at the end

mod summary;
pub mod stats;

pub use stats::{log_statistics, CrawlStatistics};
pub use summary::{export_summary, SummaryReport};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
