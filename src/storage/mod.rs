//! Storage module for persisting downloaded resources
//!
//! This module maps a canonical resource plus its content type to a path
//! below the course output root:
//!
//! ```text
//! <output-root>/course-<id>/<scheme>-<host>/<url-path>[/id-<id>][.<ext>]
//! ```
//!
//! The mapping is deterministic. Two resources that map to the same path
//! overwrite each other; the coordinator detects and logs that case.

mod error;
mod layout;

pub use error::{StorageError, StorageResult};
pub use layout::{OutputLayout, SUMMARY_FILE_NAME};

/// Closed set of content kinds the dispatcher distinguishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/html`: pruned by the content processor before writing
    Html,
    /// `application/pdf`
    Pdf,
    /// Anything else, written byte for byte
    Other(String),
}

impl ContentKind {
    /// Classifies a `Content-Type` header value, ignoring parameters such as `charset`
    ///
    /// # Examples
    ///
    /// ```
    /// use moodle_mirror::storage::ContentKind;
    ///
    /// assert_eq!(ContentKind::from_header("text/html; charset=utf-8"), ContentKind::Html);
    /// assert_eq!(ContentKind::from_header("application/pdf"), ContentKind::Pdf);
    /// ```
    pub fn from_header(value: &str) -> Self {
        let media_type = value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "text/html" => Self::Html,
            "application/pdf" => Self::Pdf,
            _ => Self::Other(media_type),
        }
    }

    /// File extension appended when the mirrored path has none
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Other(_) => "bin",
        }
    }

    /// The bare media type, e.g. `text/html`
    pub fn media_type(&self) -> &str {
        match self {
            Self::Html => "text/html",
            Self::Pdf => "application/pdf",
            Self::Other(media_type) => media_type,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Self::Html)
    }
}
