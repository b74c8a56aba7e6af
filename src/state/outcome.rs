//! Terminal outcome of processing one claimed resource

use std::fmt;

/// What happened to a resource after it was claimed from the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceOutcome {
    // ===== Success States =====
    /// An HTML page was fetched, pruned and written
    SavedPage,

    /// A non-HTML body was written unmodified
    SavedFile,

    /// The server answered 3xx; the target went back through the frontier
    Redirected,

    // ===== Error States =====
    /// The server answered with a status outside 2xx/3xx
    BadStatus,

    /// Transport or filesystem failure scoped to this resource
    Failed,
}

impl ResourceOutcome {
    /// Returns true if something was written to disk
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::SavedPage | Self::SavedFile)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::BadStatus | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SavedPage => "saved_page",
            Self::SavedFile => "saved_file",
            Self::Redirected => "redirected",
            Self::BadStatus => "bad_status",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible outcomes
    pub fn all() -> [Self; 5] {
        [
            Self::SavedPage,
            Self::SavedFile,
            Self::Redirected,
            Self::BadStatus,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ResourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
