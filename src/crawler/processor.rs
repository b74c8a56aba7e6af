//! HTML content processor
//!
//! This module handles fetched HTML pages:
//! - Link discovery over the full, unpruned document
//! - Locating the primary content region and its enclosing `<body>`
//! - Splicing the document so `<body>` contains only that region
//! - Serializing the result for persistence

use crate::url::Resource;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// Result of processing one HTML page
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    /// Serialized document, pruned to the content region when it was found
    pub html: String,

    /// Raw `href`/`src` values in document order, unresolved
    pub links: Vec<String>,

    /// Whether the content region was found and spliced into `<body>`
    pub spliced: bool,
}

/// Prunes Moodle pages down to their primary content region
#[derive(Debug, Clone)]
pub struct ContentProcessor {
    content_class: String,
}

impl ContentProcessor {
    /// Creates a processor looking for `<div class="... {content_class} ...">`
    pub fn new(content_class: impl Into<String>) -> Self {
        Self {
            content_class: content_class.into(),
        }
    }

    /// Parses, scans and prunes one HTML page
    ///
    /// Links are collected before pruning so navigation and sidebars still
    /// contribute to discovery. If the page lacks the content region or an
    /// enclosing `<body>`, a warning is logged and the document is kept whole.
    ///
    /// # Example
    ///
    /// ```
    /// use moodle_mirror::crawler::ContentProcessor;
    /// use moodle_mirror::url::{canonicalize, Link};
    ///
    /// let Link::Resource(page) = canonicalize("https://lms.test/course/view.php?id=5", None).unwrap() else {
    ///     unreachable!()
    /// };
    /// let html = r#"<html><body><nav><a href="/my/">Home</a></nav>
    ///     <div class="region-main"><a href="/mod/page/view.php?id=1">Week 1</a></div></body></html>"#;
    ///
    /// let page = ContentProcessor::new("region-main").process(html, &page);
    /// assert!(page.spliced);
    /// assert_eq!(page.links, vec!["/my/", "/mod/page/view.php?id=1"]);
    /// assert!(!page.html.contains("<nav>"));
    /// ```
    pub fn process(&self, body: &str, resource: &Resource) -> ProcessedPage {
        let mut document = Html::parse_document(body);

        let links = extract_links(&document);

        let spliced = match find_body_and_content(&document, &self.content_class) {
            Some((body_id, content_id)) => {
                splice_content(&mut document, body_id, content_id);
                true
            }
            None => {
                tracing::warn!("Found HTML without expected structure: {}", resource);
                false
            }
        };

        ProcessedPage {
            html: document.html(),
            links,
            spliced,
        }
    }
}

/// Collects `a[href]` and `img[src]` values from the whole document
fn extract_links(document: &Html) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href], img[src]") {
        for element in document.select(&selector) {
            let attribute = match element.value().name() {
                "a" => "href",
                "img" => "src",
                _ => continue,
            };

            if let Some(value) = element.value().attr(attribute) {
                let value = value.trim();
                if !value.is_empty() {
                    links.push(value.to_string());
                }
            }
        }
    }

    links
}

/// Finds the first content `div` in document order and its nearest `<body>` ancestor
fn find_body_and_content(document: &Html, content_class: &str) -> Option<(NodeId, NodeId)> {
    let content = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| {
            element.value().name() == "div"
                && element.value().classes().any(|class| class == content_class)
        })?;

    let body = content
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "body")?;

    Some((body.id(), content.id()))
}

/// Makes `content_id` the only child of `body_id`
fn splice_content(document: &mut Html, body_id: NodeId, content_id: NodeId) {
    let (others, direct_child): (Vec<NodeId>, bool) = match document.tree.get(body_id) {
        Some(body) => (
            body.children()
                .map(|child| child.id())
                .filter(|id| *id != content_id)
                .collect(),
            body.children().any(|child| child.id() == content_id),
        ),
        None => return,
    };

    for id in others {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    if direct_child {
        return;
    }

    // Lift the region out of whatever wrapper it sat in; the wrapper itself
    // was detached above, so body is empty here
    if let Some(mut content) = document.tree.get_mut(content_id) {
        content.detach();
    }
    if let Some(mut body) = document.tree.get_mut(body_id) {
        body.append_id(content_id);
    }
}
