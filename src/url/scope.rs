/// Path prefixes that are never crawled
///
/// User profiles, forums, theme assets, course search, dashboards, messaging,
/// login/auth, portfolios, participant lists and grade overviews. These are
/// personalised pages whose link graph is unbounded and carries no course
/// material.
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "/user",
    "/mod/forum",
    "/theme",
    "/course/search.php",
    "/my",
    "/message",
    "/auth",
    "/login",
    "/portfolio",
    "/course/user.php",
    "/grade/report/overview",
];

/// Checks whether a path should be queued when found on the course host
///
/// The empty path, the bare root and every path under one of
/// [`EXCLUDED_PREFIXES`] are not relevant.
///
/// # Examples
///
/// ```
/// use moodle_mirror::url::is_relevant;
///
/// assert!(is_relevant("/mod/resource/view.php"));
/// assert!(!is_relevant("/mod/forum/view.php"));
/// assert!(!is_relevant("/"));
/// ```
pub fn is_relevant(path: &str) -> bool {
    if path.is_empty() || path == "/" {
        return false;
    }

    !EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}
