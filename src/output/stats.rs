//! Run statistics
//!
//! Counts what happened to each claimed resource during one crawl and logs
//! a short report when the run finishes.

use crate::state::ResourceOutcome;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Crawl statistics for one run
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Count of claimed resources by outcome
    pub outcomes: HashMap<ResourceOutcome, u64>,

    /// Raw link values handed to the frontier
    pub links_discovered: u64,

    /// HTML pages pruned down to their content region
    pub spliced_pages: u64,

    /// HTML pages kept whole because the content region was missing
    pub unspliced_pages: u64,

    /// Writes that replaced a file written earlier in the same run
    pub overwritten_paths: u64,

    pub bytes_written: u64,
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcomes: HashMap::new(),
            links_discovered: 0,
            spliced_pages: 0,
            unspliced_pages: 0,
            overwritten_paths: 0,
            bytes_written: 0,
        }
    }

    pub fn record(&mut self, outcome: ResourceOutcome) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
    }

    pub fn count(&self, outcome: ResourceOutcome) -> u64 {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Number of resources claimed from the frontier
    pub fn total_processed(&self) -> u64 {
        self.outcomes.values().sum()
    }

    pub fn total_errors(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|(outcome, _)| outcome.is_error())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of processed resources that were saved, as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.total_processed();
        if total == 0 {
            return 0.0;
        }
        let saved: u64 = ResourceOutcome::all()
            .iter()
            .filter(|outcome| outcome.is_saved())
            .map(|outcome| self.count(*outcome))
            .sum();
        (saved as f64 / total as f64) * 100.0
    }
}

/// Logs the statistics at info level
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!("=== Crawl Statistics ===");
    tracing::info!("Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        tracing::info!("Finished: {}", finished.to_rfc3339());
    }
    if let Some(duration) = stats.duration_seconds() {
        tracing::info!("Duration: {}s", duration);
    }

    tracing::info!("Resources processed: {}", stats.total_processed());
    for outcome in ResourceOutcome::all() {
        let count = stats.count(outcome);
        if count > 0 {
            tracing::info!("  {}: {}", outcome, count);
        }
    }

    tracing::info!(
        "HTML pages: {} pruned, {} kept whole",
        stats.spliced_pages,
        stats.unspliced_pages
    );
    tracing::info!("Links discovered: {}", stats.links_discovered);
    tracing::info!("Bytes written: {}", stats.bytes_written);

    if stats.overwritten_paths > 0 {
        tracing::warn!(
            "{} files were overwritten by resources mapping to the same path",
            stats.overwritten_paths
        );
    }

    tracing::info!(
        "Success rate: {:.1}% ({} errors)",
        stats.success_rate(),
        stats.total_errors()
    );
}
