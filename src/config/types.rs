use serde::Deserialize;

/// Main configuration structure for Moodle-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub course: CourseConfig,
    pub session: SessionConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// The course to mirror
#[derive(Debug, Clone, Deserialize)]
pub struct CourseConfig {
    /// Scheme, host and optional path prefix of the Moodle instance
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Numeric course identifier (`/course/view.php?id=<course-id>`)
    #[serde(rename = "course-id")]
    pub course_id: u64,
}

/// Session cookie used to authenticate every request
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "cookie-name")]
    pub cookie_name: String,

    #[serde(rename = "cookie-value")]
    pub cookie_value: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory; each course is mirrored into `course-<id>` below it
    pub directory: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Longest wait, in seconds, for response headers or for the next chunk
    /// of a body
    ///
    /// This bounds stalls, not total transfer time: a download that keeps
    /// receiving data may take as long as it needs.
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Class marking the primary content `div` of a Moodle page
    #[serde(rename = "content-class")]
    pub content_class: String,

    /// Abort the whole run on the first transport or filesystem error
    #[serde(rename = "abort-on-error")]
    pub abort_on_error: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("moodle-mirror/{}", env!("CARGO_PKG_VERSION")),
            content_class: "region-main".to_string(),
            abort_on_error: false,
        }
    }
}
