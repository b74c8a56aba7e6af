//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the authenticated HTTP client (session cookie, timeouts)
//! - Issuing one GET per claimed resource
//! - Classifying responses as success, redirect or bad status
//! - Streaming non-HTML bodies to disk unmodified

use crate::config::Config;
use crate::storage::ContentKind;
use crate::url::Resource;
use crate::{MirrorError, Result};
use reqwest::cookie::Jar;
use reqwest::{header, redirect::Policy, Client, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Classified response for one resource
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx; the body has not been read yet
    Success {
        /// Declared content kind, parameters stripped
        kind: ContentKind,
        /// The response, to be routed by content kind
        response: Response,
    },

    /// 3xx; the `Location` header if present
    Redirect {
        status_code: u16,
        location: Option<String>,
    },

    /// Any other status; not retried, not persisted
    BadStatus { status_code: u16 },
}

/// Builds the authenticated HTTP client
///
/// The session cookie from the configuration is stored in a cookie jar for
/// the base URL. Automatic redirects are disabled: a 3xx goes back through
/// the frontier so redirect targets are deduplicated like any other link.
///
/// Only connection setup has a client-level deadline. Stalls while waiting
/// for headers or body data are bounded per request by [`fetch`] and the
/// body readers, so a large download that keeps making progress is never cut
/// off.
///
/// # Example
///
/// ```no_run
/// use moodle_mirror::config::load_config;
/// use moodle_mirror::crawler::build_http_client;
/// use std::path::Path;
/// use url::Url;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// let base = Url::parse(&config.course.base_url).unwrap();
/// let client = build_http_client(&config, &base).unwrap();
/// ```
pub fn build_http_client(config: &Config, base: &Url) -> std::result::Result<Client, reqwest::Error> {
    let jar = Jar::default();
    jar.add_cookie_str(
        &format!(
            "{}={}; Path=/",
            config.session.cookie_name, config.session.cookie_value
        ),
        base,
    );

    Client::builder()
        .user_agent(config.crawler.user_agent.as_str())
        .cookie_provider(Arc::new(jar))
        .connect_timeout(Duration::from_secs(config.crawler.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET for the resource and classifies the response by status
///
/// `stall` bounds the wait for the response headers.
///
/// # Errors
///
/// Returns [`MirrorError::Http`] for connection failures and
/// [`MirrorError::Timeout`] when no headers arrive within `stall`.
pub async fn fetch(client: &Client, resource: &Resource, stall: Duration) -> Result<FetchOutcome> {
    let url = resource.to_url()?;
    tracing::info!("Fetching {}", resource);

    let response = tokio::time::timeout(stall, client.get(url).send())
        .await
        .map_err(|_| stalled(resource, stall))?
        .map_err(|source| MirrorError::Http {
            url: resource.to_string(),
            source,
        })?;

    Ok(classify(response))
}

/// Maps a response to success, redirect or bad status
fn classify(response: Response) -> FetchOutcome {
    let status = response.status();

    if status.is_success() {
        let kind = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ContentKind::from_header)
            .unwrap_or_else(|| ContentKind::from_header(""));
        return FetchOutcome::Success { kind, response };
    }

    if status.is_redirection() {
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        return FetchOutcome::Redirect {
            status_code: status.as_u16(),
            location,
        };
    }

    FetchOutcome::BadStatus {
        status_code: status.as_u16(),
    }
}

fn stalled(resource: &Resource, stall: Duration) -> MirrorError {
    MirrorError::Timeout {
        url: resource.to_string(),
        stalled_for: stall,
    }
}

fn body_error(resource: &Resource, source: reqwest::Error) -> MirrorError {
    MirrorError::Body {
        url: resource.to_string(),
        source,
    }
}

/// Reads an HTML body as text
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub async fn read_text(mut response: Response, resource: &Resource, stall: Duration) -> Result<String> {
    let mut body = Vec::new();
    while let Some(chunk) = tokio::time::timeout(stall, response.chunk())
        .await
        .map_err(|_| stalled(resource, stall))?
        .map_err(|source| body_error(resource, source))?
    {
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Streams a body to `path` byte for byte and returns the number of bytes written
///
/// The body goes to a `.part` file next to `path` first and is renamed into
/// place only once the whole body has arrived. On failure the partial file is
/// removed and `path` is left as it was.
pub async fn write_raw(
    response: Response,
    resource: &Resource,
    path: &Path,
    stall: Duration,
) -> Result<u64> {
    let partial = partial_path(path);

    let result = match stream_to_file(response, resource, &partial, stall).await {
        Ok(written) => tokio::fs::rename(&partial, path)
            .await
            .map(|()| written)
            .map_err(|source| MirrorError::Write {
                path: path.to_path_buf(),
                source,
            }),
        Err(e) => Err(e),
    };

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove partial download {}: {}", partial.display(), e);
            }
        }
    }

    result
}

/// `<dir>/.<name>.part`
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.part", name))
}

async fn stream_to_file(
    mut response: Response,
    resource: &Resource,
    path: &Path,
    stall: Duration,
) -> Result<u64> {
    let write_error = |source: std::io::Error| MirrorError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(write_error)?;
    let mut written = 0u64;

    while let Some(chunk) = tokio::time::timeout(stall, response.chunk())
        .await
        .map_err(|_| stalled(resource, stall))?
        .map_err(|source| body_error(resource, source))?
    {
        file.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(write_error)?;
    Ok(written)
}
