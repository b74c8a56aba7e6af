//! URL handling module for Moodle-Mirror
//!
//! This module provides the canonical [`Resource`] identity used for
//! deduplication, link canonicalization, and the path relevance filter.

mod canonical;
mod scope;

pub use canonical::{canonicalize, Link};
pub use scope::{is_relevant, EXCLUDED_PREFIXES};

use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// The only query parameter that survives canonicalization
pub const ID_PARAM: &str = "id";

/// Canonical identity of a fetchable thing
///
/// Two URLs that differ only in fragment or in query parameters other than
/// `id` map to the same `Resource`. Equality and hashing cover exactly
/// scheme, host, path and the optional `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resource {
    scheme: String,
    host: String,
    path: String,
    id: Option<String>,
}

impl Resource {
    /// Builds the canonical identity of an absolute http(s) URL
    ///
    /// The host keeps a non-default port, so two servers on one machine stay
    /// distinct hosts.
    ///
    /// # Examples
    ///
    /// ```
    /// use moodle_mirror::url::Resource;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://lms.test/course/view.php?id=5&section=2#top").unwrap();
    /// let resource = Resource::from_url(&url).unwrap();
    /// assert_eq!(resource.to_string(), "https://lms.test/course/view.php?id=5");
    /// ```
    pub fn from_url(url: &Url) -> UrlResult<Self> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UrlError::InvalidScheme(scheme.to_string()));
        }

        let host = url.host_str().ok_or(UrlError::MissingDomain)?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let id = url
            .query_pairs()
            .find(|(key, _)| key == ID_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            scheme: scheme.to_string(),
            host,
            path: url.path().to_string(),
            id,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host including a non-default port
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns true if this resource lives on a different host than `base_host`
    pub fn is_external_to(&self, base_host: &str) -> bool {
        self.host != base_host
    }

    /// Returns true if the path passes the relevance filter
    pub fn is_relevant(&self) -> bool {
        is_relevant(&self.path)
    }

    /// Materializes the full URL (scheme, host, path and `id` query)
    pub fn to_url(&self) -> UrlResult<Url> {
        Url::parse(&self.to_string()).map_err(|e| UrlError::Parse(e.to_string()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)?;
        if let Some(id) = &self.id {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair(ID_PARAM, id)
                .finish();
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

/// Builds the host key of a base URL the same way [`Resource::host`] does
pub fn host_key(url: &Url) -> UrlResult<String> {
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
