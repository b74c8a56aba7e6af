//! Crawler module for course mirroring
//!
//! This module contains the core crawling logic, including:
//! - The frontier of queued and claimed resources
//! - HTTP fetching with the authenticated session
//! - HTML pruning and link extraction
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod processor;

pub use coordinator::{run_crawl, Coordinator, RunContext};
pub use fetcher::{build_http_client, fetch, read_text, write_raw, FetchOutcome};
pub use frontier::{EnqueueOutcome, Frontier};
pub use processor::{ContentProcessor, ProcessedPage};

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for mirroring a course. It will:
/// 1. Build the run context and HTTP client
/// 2. Seed the frontier with the course landing page
/// 3. Fetch, prune and persist every in-scope resource
/// 4. Record external references
/// 5. Write `summary.txt`
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed successfully
/// * `Err(MirrorError)` - Crawl aborted
pub async fn crawl(config: Config) -> Result<CrawlStatistics> {
    run_crawl(&config).await
}
