use super::{ContentKind, StorageError, StorageResult};
use crate::url::Resource;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Name of the report written into the base host directory
pub const SUMMARY_FILE_NAME: &str = "summary.txt";

/// File name used when a resource path has no segments at all
const INDEX_FILE_STEM: &str = "index";

/// Maps resources to files below `<output-dir>/course-<id>`
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Creates the layout for one course below `output_dir`
    pub fn new(output_dir: &Path, course_id: u64) -> Self {
        Self {
            root: output_dir.join(format!("course-{}", course_id)),
        }
    }

    /// The course root, `<output-dir>/course-<id>`
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything mirrored from one scheme and host
    pub fn host_dir(&self, scheme: &str, host: &str) -> PathBuf {
        self.root.join(format!("{}-{}", scheme, host))
    }

    /// Location of `summary.txt` for the base host
    pub fn summary_path(&self, scheme: &str, host: &str) -> PathBuf {
        self.host_dir(scheme, host).join(SUMMARY_FILE_NAME)
    }

    /// Computes the destination of a resource without touching the filesystem
    ///
    /// # Examples
    ///
    /// ```
    /// use moodle_mirror::storage::{ContentKind, OutputLayout};
    /// use moodle_mirror::url::Resource;
    /// use std::path::Path;
    /// use url::Url;
    ///
    /// let layout = OutputLayout::new(Path::new("/out"), 5);
    /// let url = Url::parse("https://lms.test/course/view.php?id=5").unwrap();
    /// let resource = Resource::from_url(&url).unwrap();
    ///
    /// assert_eq!(
    ///     layout.file_path(&resource, &ContentKind::Html),
    ///     Path::new("/out/course-5/https-lms.test/course/view.php/id-5.html")
    /// );
    /// ```
    pub fn file_path(&self, resource: &Resource, kind: &ContentKind) -> PathBuf {
        let mut path = self.host_dir(resource.scheme(), resource.host());
        let mut pushed = false;

        for segment in resource.path().split('/') {
            let segment = sanitize_component(&percent_decode_str(segment).decode_utf8_lossy());
            if segment.is_empty() || segment == "." || segment == ".." {
                continue;
            }
            path.push(segment);
            pushed = true;
        }

        if let Some(id) = resource.id() {
            path.push(format!("id-{}", sanitize_component(id)));
            pushed = true;
        }

        if !pushed {
            path.push(INDEX_FILE_STEM);
        }

        if path.extension().is_none() {
            path.set_extension(kind.extension());
        }

        path
    }

    /// Computes the destination of a resource and creates its parent directories
    ///
    /// # Errors
    ///
    /// Fails if a directory cannot be created, e.g. because a file already
    /// occupies a parent path component.
    pub fn path_for(&self, resource: &Resource, kind: &ContentKind) -> StorageResult<PathBuf> {
        let path = self.file_path(resource, kind);
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::NoParent(path.clone()))?;

        std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;

        Ok(path)
    }
}

/// Replaces characters that would let a decoded segment or `id` leave its directory
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}
