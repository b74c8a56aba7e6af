use super::Resource;
use crate::{UrlError, UrlResult};
use url::Url;

/// A discovered link after resolution and classification by scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// An http(s) target, canonicalized
    Resource(Resource),
    /// A `mailto:` address; recorded in the log, never enqueued
    Mail(String),
    /// Any other scheme (`javascript:`, `tel:`, `data:`, ...)
    Unsupported(String),
}

/// Resolves and canonicalizes a raw link found on `reference`
///
/// Relative links are resolved against the page they were found on;
/// absolute links are canonicalized directly. Without a reference only
/// absolute URLs are accepted.
///
/// # Errors
///
/// Returns [`UrlError::Parse`] for malformed URLs. The caller drops that one
/// link and carries on.
///
/// # Examples
///
/// ```
/// use moodle_mirror::url::{canonicalize, Link};
///
/// let page = match canonicalize("https://lms.test/course/view.php?id=5", None).unwrap() {
///     Link::Resource(r) => r,
///     _ => unreachable!(),
/// };
///
/// let link = canonicalize("../mod/page/view.php?id=9&forceview=1", Some(&page)).unwrap();
/// assert_eq!(
///     link,
///     canonicalize("https://lms.test/mod/page/view.php?id=9", None).unwrap()
/// );
/// ```
pub fn canonicalize(raw: &str, reference: Option<&Resource>) -> UrlResult<Link> {
    let raw = raw.trim();

    let parsed = match reference {
        Some(reference) => reference.to_url()?.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("'{}': {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(Link::Resource(Resource::from_url(&parsed)?)),
        "mailto" => Ok(Link::Mail(parsed.path().to_string())),
        other => Ok(Link::Unsupported(other.to_string())),
    }
}
