//! Plain-text summary of a finished crawl
//!
//! The report lists every resource in the frontier's done set, split into
//! resources downloaded from the course host and external references:
//!
//! ```text
//! The crawler downloaded <N> moodle resources:
//! 	<url>
//! The crawler found <M> external resources:
//! 	<url>
//! ```

use crate::crawler::Frontier;
use crate::output::{OutputError, OutputResult};
use crate::url::Resource;
use std::fmt::Write as _;
use std::path::Path;

/// Sorted partition of the done set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryReport {
    downloaded: Vec<String>,
    external: Vec<String>,
}

impl SummaryReport {
    /// Partitions resources by host and sorts each side lexicographically
    pub fn from_done<'a, I>(done: I, base_host: &str) -> Self
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let mut report = Self::default();

        for resource in done {
            if resource.is_external_to(base_host) {
                report.external.push(resource.to_string());
            } else {
                report.downloaded.push(resource.to_string());
            }
        }

        report.downloaded.sort();
        report.external.sort();
        report
    }

    /// Resources claimed on the course host, sorted
    pub fn downloaded(&self) -> &[String] {
        &self.downloaded
    }

    /// Resources referenced on other hosts, sorted
    pub fn external(&self) -> &[String] {
        &self.external
    }

    /// Formats the report in its fixed text layout
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "The crawler downloaded {} moodle resources:",
            self.downloaded.len()
        );
        for url in &self.downloaded {
            let _ = writeln!(out, "\t{}", url);
        }

        let _ = writeln!(
            out,
            "The crawler found {} external resources:",
            self.external.len()
        );
        for url in &self.external {
            let _ = writeln!(out, "\t{}", url);
        }

        out
    }
}

/// Writes `summary.txt` for the frontier's done set to `path`
///
/// The done set is copied under its mutex and never modified.
///
/// # Returns
///
/// * `Ok(SummaryReport)` - The report that was written
/// * `Err(OutputError)` - The directory or file could not be written
pub fn export_summary(frontier: &Frontier, path: &Path) -> OutputResult<SummaryReport> {
    let done = frontier.done_snapshot();
    let report = SummaryReport::from_done(&done, frontier.base_host());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| OutputError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, report.render()).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "Summary written to {} ({} downloaded, {} external)",
        path.display(),
        report.downloaded.len(),
        report.external.len()
    );

    Ok(report)
}
