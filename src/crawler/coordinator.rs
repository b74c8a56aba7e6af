//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Building the run context from configuration
//! - Seeding the frontier with the course landing page
//! - Claiming, fetching and dispatching one resource at a time
//! - Deciding per error whether to skip the resource or abort the run
//! - Writing the summary report and logging statistics

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch, read_text, write_raw, FetchOutcome};
use crate::crawler::{ContentProcessor, EnqueueOutcome, Frontier};
use crate::output::{export_summary, log_statistics, CrawlStatistics};
use crate::state::ResourceOutcome;
use crate::storage::{ContentKind, OutputLayout};
use crate::url::{host_key, Resource, ID_PARAM};
use crate::{ConfigError, MirrorError, Result};
use reqwest::{Client, Response};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

/// Everything a run needs, built once from configuration
///
/// The client and the output layout are read-only after construction.
#[derive(Debug, Clone)]
pub struct RunContext {
    base: Url,
    base_host: String,
    course_id: u64,
    layout: OutputLayout,
    client: Client,
    processor: ContentProcessor,
    stall_timeout: Duration,
    abort_on_error: bool,
}

impl RunContext {
    /// Builds the context and creates the output directory
    ///
    /// A relative output directory is resolved against the current working
    /// directory.
    ///
    /// # Errors
    ///
    /// * `MirrorError::Config` - The base URL is unusable
    /// * `MirrorError::Io` - The output directory cannot be created
    /// * `MirrorError::Reqwest` - The HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.course.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("{}: {}", config.course.base_url, e))
        })?;
        let base_host = host_key(&base)?;

        let output_dir = absolute_dir(Path::new(&config.output.directory))?;
        std::fs::create_dir_all(&output_dir)?;
        let layout = OutputLayout::new(&output_dir, config.course.course_id);

        let client = build_http_client(config, &base)?;

        Ok(Self {
            base,
            base_host,
            course_id: config.course.course_id,
            layout,
            client,
            processor: ContentProcessor::new(config.crawler.content_class.clone()),
            stall_timeout: Duration::from_secs(config.crawler.request_timeout_secs),
            abort_on_error: config.crawler.abort_on_error,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Host of the base URL including a non-default port
    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    pub fn course_id(&self) -> u64 {
        self.course_id
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// The course landing page, `<base>/course/view.php?id=<course-id>`
    ///
    /// Any path prefix on the base URL is kept.
    pub fn seed_url(&self) -> String {
        format!(
            "{}/course/view.php?{}={}",
            self.base.as_str().trim_end_matches('/'),
            ID_PARAM,
            self.course_id
        )
    }

    /// Where `summary.txt` goes: the directory of the base scheme and host
    pub fn summary_path(&self) -> PathBuf {
        self.layout.summary_path(self.base.scheme(), &self.base_host)
    }
}

fn absolute_dir(dir: &Path) -> std::io::Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: RunContext,
    frontier: Frontier,
    stats: CrawlStatistics,
    written: HashSet<PathBuf>,
}

impl Coordinator {
    /// Creates a coordinator with an empty frontier bound to the base host
    pub fn new(context: RunContext) -> Self {
        let frontier = Frontier::new(context.base_host.clone());
        Self {
            context,
            frontier,
            stats: CrawlStatistics::new(),
            written: HashSet::new(),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn statistics(&self) -> &CrawlStatistics {
        &self.stats
    }

    /// Runs the crawl until the frontier is exhausted
    ///
    /// Resource-scoped failures are logged and counted unless the run was
    /// configured to abort on error. The summary is written once the queue
    /// drains.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - Crawl completed and the summary was written
    /// * `Err(MirrorError)` - The run aborted
    pub async fn run(&mut self) -> Result<CrawlStatistics> {
        let seed = self.context.seed_url();
        tracing::info!("Starting crawl of course {} at {}", self.context.course_id, seed);

        match self.frontier.enqueue(&seed, None)? {
            EnqueueOutcome::Queued(resource) => tracing::debug!("Seeded frontier with {}", resource),
            other => tracing::warn!("Seed URL was not queued: {:?}", other),
        }

        let start_time = Instant::now();
        let mut processed: u64 = 0;

        while let Some(resource) = self.frontier.claim_next() {
            let outcome = match self.process_resource(&resource).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_resource_scoped() && !self.context.abort_on_error => {
                    tracing::warn!("Failed to process {}: {}", resource, e);
                    ResourceOutcome::Failed
                }
                Err(e) => {
                    tracing::error!("Aborting crawl at {}: {}", resource, e);
                    return Err(e);
                }
            };
            self.stats.record(outcome);
            processed += 1;

            if processed % 10 == 0 {
                let elapsed = start_time.elapsed().as_secs_f64();
                let rate = if elapsed > 0.0 {
                    processed as f64 / elapsed
                } else {
                    0.0
                };
                tracing::info!(
                    "Progress: {} resources processed, {} queued, {:.2} resources/sec",
                    processed,
                    self.frontier.queue_len(),
                    rate
                );
            }
        }

        tracing::info!(
            "Frontier is empty, crawl complete: {} resources in {:?}",
            processed,
            start_time.elapsed()
        );

        export_summary(&self.frontier, &self.context.summary_path())?;

        self.stats.finish();
        log_statistics(&self.stats);

        Ok(self.stats.clone())
    }

    /// Fetches one claimed resource and dispatches the response
    async fn process_resource(&mut self, resource: &Resource) -> Result<ResourceOutcome> {
        match fetch(&self.context.client, resource, self.context.stall_timeout).await? {
            FetchOutcome::Success { kind, response } => {
                self.save(resource, kind, response).await
            }

            FetchOutcome::Redirect {
                status_code,
                location: Some(location),
            } => {
                match self.frontier.enqueue(&location, Some(resource)) {
                    Ok(outcome) => tracing::info!(
                        "Redirect {} from {} to {}: {:?}",
                        status_code,
                        resource,
                        location,
                        outcome
                    ),
                    Err(e) => tracing::warn!(
                        "Ignoring malformed redirect from {} to {}: {}",
                        resource,
                        location,
                        e
                    ),
                }
                Ok(ResourceOutcome::Redirected)
            }

            FetchOutcome::Redirect {
                status_code,
                location: None,
            } => {
                tracing::warn!("Redirect {} from {} without Location header", status_code, resource);
                Ok(ResourceOutcome::Redirected)
            }

            FetchOutcome::BadStatus { status_code } => {
                tracing::warn!("Unexpected status {} for {}", status_code, resource);
                Ok(ResourceOutcome::BadStatus)
            }
        }
    }

    /// Persists a 2xx response: HTML is pruned and scanned, the rest is copied
    async fn save(
        &mut self,
        resource: &Resource,
        kind: ContentKind,
        response: Response,
    ) -> Result<ResourceOutcome> {
        let path = self.context.layout.path_for(resource, &kind)?;
        self.note_write(&path, resource);

        if !kind.is_html() {
            let bytes = write_raw(response, resource, &path, self.context.stall_timeout).await?;
            tracing::debug!("Saved {} ({}, {} bytes) to {}", resource, kind.media_type(), bytes, path.display());
            self.stats.bytes_written += bytes;
            return Ok(ResourceOutcome::SavedFile);
        }

        let body = read_text(response, resource, self.context.stall_timeout).await?;
        let page = self.context.processor.process(&body, resource);

        if page.spliced {
            self.stats.spliced_pages += 1;
        } else {
            self.stats.unspliced_pages += 1;
        }

        self.enqueue_links(&page.links, resource);

        tokio::fs::write(&path, page.html.as_bytes())
            .await
            .map_err(|source| MirrorError::Write {
                path: path.clone(),
                source,
            })?;
        self.stats.bytes_written += page.html.len() as u64;
        tracing::debug!("Saved {} to {}", resource, path.display());

        Ok(ResourceOutcome::SavedPage)
    }

    /// Feeds raw links to the frontier, resolved against the page they came from
    fn enqueue_links(&mut self, links: &[String], resource: &Resource) {
        let mut queued = 0usize;

        for link in links {
            self.stats.links_discovered += 1;
            match self.frontier.enqueue(link, Some(resource)) {
                Ok(EnqueueOutcome::Queued(_)) => queued += 1,
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping malformed link {:?} on {}: {}", link, resource, e),
            }
        }

        tracing::info!(
            "Found {} links on {}, {} newly queued",
            links.len(),
            resource,
            queued
        );
    }

    fn note_write(&mut self, path: &Path, resource: &Resource) {
        if !self.written.insert(path.to_path_buf()) {
            tracing::warn!(
                "Overwriting {} with {}: another resource mapped to the same path",
                path.display(),
                resource
            );
            self.stats.overwritten_paths += 1;
        }
    }
}

/// Builds the run context, crawls the course and returns the statistics
///
/// # Arguments
///
/// * `config` - The validated configuration
pub async fn run_crawl(config: &Config) -> Result<CrawlStatistics> {
    let context = RunContext::from_config(config)?;
    let mut coordinator = Coordinator::new(context);
    coordinator.run().await
}
