//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for a Moodle instance and run the
//! full crawl cycle end-to-end into a temporary output directory.

use moodle_mirror::config::{Config, CourseConfig, CrawlerConfig, OutputConfig, SessionConfig};
use moodle_mirror::crawler::{Coordinator, RunContext};
use moodle_mirror::url::{host_key, Resource};
use moodle_mirror::{MirrorError, ResourceOutcome};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for course 5 on the mock server
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        course: CourseConfig {
            base_url: base_url.to_string(),
            course_id: 5,
        },
        session: SessionConfig {
            cookie_name: "MoodleSession".to_string(),
            cookie_value: "secret".to_string(),
        },
        output: OutputConfig {
            directory: dir.to_string_lossy().into_owned(),
        },
        crawler: CrawlerConfig {
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            ..CrawlerConfig::default()
        },
    }
}

fn coordinator(config: &Config) -> Coordinator {
    Coordinator::new(RunContext::from_config(config).expect("Failed to build run context"))
}

/// `<dir>/course-5/http-<host:port>`
fn host_dir(dir: &Path, server: &MockServer) -> PathBuf {
    let host = host_key(&Url::parse(&server.uri()).unwrap()).unwrap();
    dir.join("course-5").join(format!("http-{}", host))
}

fn resource(raw: &str) -> Resource {
    Resource::from_url(&Url::parse(raw).unwrap()).unwrap()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

async fn mount_page(server: &MockServer, page_path: &str, id: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(query_param("id", id))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_course() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/course/view.php",
        "5",
        html(
            r#"<html><head><title>Course 5</title></head><body>
            <nav><a href="/mod/resource/view.php?id=9">Slides</a></nav>
            <div id="page"><div class="region-main"><p>Welcome to the course</p>
            <a href="https://other.example.com/x">Reading</a></div></div>
            <footer>FOOTER</footer></body></html>"#,
        ),
    )
    .await;

    let pdf = b"%PDF-1.4 slide deck".to_vec();
    mount_page(
        &mock_server,
        "/mod/resource/view.php",
        "9",
        ResponseTemplate::new(200).set_body_raw(pdf.clone(), "application/pdf"),
    )
    .await;

    let config = create_test_config(&base_url, dir.path());
    let mut coordinator = coordinator(&config);
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.count(ResourceOutcome::SavedPage), 1);
    assert_eq!(stats.count(ResourceOutcome::SavedFile), 1);
    assert_eq!(stats.spliced_pages, 1);
    assert_eq!(stats.total_errors(), 0);

    let frontier = coordinator.frontier();
    assert!(frontier.is_empty());
    assert_eq!(frontier.done_len(), 3);
    assert!(frontier.is_done(&resource("https://other.example.com/x")));

    let host = host_dir(dir.path(), &mock_server);

    let page = std::fs::read_to_string(host.join("course/view.php/id-5.html")).unwrap();
    assert!(page.contains("Welcome to the course"));
    assert!(page.contains("<title>Course 5</title>"));
    assert!(!page.contains("Slides"));
    assert!(!page.contains("FOOTER"));

    let saved_pdf = std::fs::read(host.join("mod/resource/view.php/id-9.pdf")).unwrap();
    assert_eq!(saved_pdf, pdf);

    let summary = std::fs::read_to_string(host.join("summary.txt")).unwrap();
    let expected = format!(
        "The crawler downloaded 2 moodle resources:\n\
         \t{base}/course/view.php?id=5\n\
         \t{base}/mod/resource/view.php?id=9\n\
         The crawler found 1 external resources:\n\
         \thttps://other.example.com/x\n",
        base = base_url
    );
    assert_eq!(summary, expected);
}

#[tokio::test]
async fn test_redirect_goes_through_frontier() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/course/view.php",
        "5",
        ResponseTemplate::new(302).insert_header("Location", "/course/view.php?id=7"),
    )
    .await;
    mount_page(
        &mock_server,
        "/course/view.php",
        "7",
        html(r#"<html><body><div class="region-main">Course 7</div></body></html>"#),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let mut coordinator = coordinator(&config);
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.count(ResourceOutcome::Redirected), 1);
    assert_eq!(stats.count(ResourceOutcome::SavedPage), 1);

    let target = resource(&format!("{}/course/view.php?id=7", mock_server.uri()));
    assert!(coordinator.frontier().is_done(&target));

    let host = host_dir(dir.path(), &mock_server);
    assert!(!host.join("course/view.php/id-5.html").exists());
    assert!(host.join("course/view.php/id-7.html").exists());
}

#[tokio::test]
async fn test_bad_status_is_not_persisted() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/course/view.php",
        "5",
        html(r#"<html><body><div class="region-main"><a href="/mod/page/view.php?id=3">Gone</a></div></body></html>"#),
    )
    .await;
    mount_page(&mock_server, "/mod/page/view.php", "3", ResponseTemplate::new(404)).await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let mut coordinator = coordinator(&config);
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.count(ResourceOutcome::BadStatus), 1);
    assert_eq!(stats.count(ResourceOutcome::SavedPage), 1);

    let host = host_dir(dir.path(), &mock_server);
    assert!(!host.join("mod/page/view.php/id-3.html").exists());
    assert!(!host.join("mod/page/view.php").exists());
}

#[tokio::test]
async fn test_each_resource_fetched_once() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // The seed and the page link to each other and to themselves
    mount_page(
        &mock_server,
        "/course/view.php",
        "5",
        html(
            r#"<html><body><div class="region-main">
            <a href="/mod/page/view.php?id=1">Page</a>
            <a href="/mod/page/view.php?id=1&amp;forceview=1">Page again</a>
            <a href="/course/view.php?id=5">Self</a>
            </div></body></html>"#,
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/mod/page/view.php",
        "1",
        html(
            r#"<html><body><div class="region-main">
            <a href="../../course/view.php?id=5#section-2">Back</a>
            <a href="view.php?id=1">Self</a>
            </div></body></html>"#,
        ),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let mut coordinator = coordinator(&config);
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.total_processed(), 2);
    assert_eq!(coordinator.frontier().done_len(), 2);
    assert_eq!(stats.overwritten_paths, 0);
    // Mock expectations (exactly one request each) are verified on drop
}

#[tokio::test]
async fn test_out_of_scope_links_are_not_fetched() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/course/view.php",
        "5",
        html(
            r#"<html><body><div class="region-main">
            <a href="/mod/forum/view.php?id=2">Forum</a>
            <a href="/user/profile.php?id=3">Lecturer</a>
            <a href="/">Home</a>
            <a href="mailto:lecturer@lms.test">Mail</a>
            <a href="javascript:void(0)">Toggle</a>
            <a href="http://[broken">Broken</a>
            </div></body></html>"#,
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/mod/forum/view.php"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/profile.php"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let mut coordinator = coordinator(&config);
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.total_processed(), 1);
    assert_eq!(stats.links_discovered, 6);
    assert_eq!(coordinator.frontier().done_len(), 1);

    let summary =
        std::fs::read_to_string(host_dir(dir.path(), &mock_server).join("summary.txt")).unwrap();
    assert!(summary.contains("The crawler downloaded 1 moodle resources:"));
    assert!(summary.contains("The crawler found 0 external resources:"));
}

#[tokio::test]
async fn test_session_cookie_is_sent() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .and(header("cookie", "MoodleSession=secret"))
        .respond_with(html(r#"<html><body><div class="region-main">Enrolled</div></body></html>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let stats = coordinator(&config).run().await.expect("Crawl failed");

    assert_eq!(stats.count(ResourceOutcome::SavedPage), 1);
}

#[tokio::test]
async fn test_page_without_content_region_kept_whole() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/course/view.php",
        "5",
        html(r#"<html><body><nav>NAV</nav><p>Login required</p></body></html>"#),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let stats = coordinator(&config).run().await.expect("Crawl failed");

    assert_eq!(stats.unspliced_pages, 1);
    let page = std::fs::read_to_string(
        host_dir(dir.path(), &mock_server).join("course/view.php/id-5.html"),
    )
    .unwrap();
    assert!(page.contains("NAV"));
    assert!(page.contains("Login required"));
}

/// Seed page linking to `view.php` and then `view.php?id=1`; the second
/// needs `view.php` as a directory after the first was saved as a file.
async fn mount_path_collision(server: &MockServer) {
    mount_page(
        server,
        "/course/view.php",
        "5",
        html(
            r#"<html><body><div class="region-main">
            <a href="/mod/page/view.php">Index</a>
            <a href="/mod/page/view.php?id=1">Page</a>
            </div></body></html>"#,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/mod/page/view.php"))
        .respond_with(html(r#"<html><body><div class="region-main">Page</div></body></html>"#))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_filesystem_error_skips_resource() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_path_collision(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let mut coordinator = coordinator(&config);
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.count(ResourceOutcome::SavedPage), 2);
    assert_eq!(stats.count(ResourceOutcome::Failed), 1);
    assert!(host_dir(dir.path(), &mock_server).join("summary.txt").exists());
}

#[tokio::test]
async fn test_abort_on_error() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_path_collision(&mock_server).await;

    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.crawler.abort_on_error = true;

    let result = coordinator(&config).run().await;

    assert!(matches!(result, Err(MirrorError::Storage(_))));
    assert!(!host_dir(dir.path(), &mock_server).join("summary.txt").exists());
}

#[tokio::test]
async fn test_connection_failure_is_resource_scoped() {
    let dir = TempDir::new().unwrap();

    // Nothing listens on the port once the listener is dropped
    let base_url = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let config = create_test_config(&base_url, dir.path());
    let stats = coordinator(&config).run().await.expect("Crawl failed");

    assert_eq!(stats.count(ResourceOutcome::Failed), 1);
}

/// How the hand-rolled server answers the file request
#[derive(Debug, Clone, Copy)]
enum FileBody {
    /// Declares 100000 bytes, sends a few, closes the connection
    Truncated,
    /// Sends headers and a few bytes, then goes quiet
    Stalled,
    /// Sends the full body in small pieces spread over a few seconds
    Trickle,
}

const FILE_SEED_PAGE: &str = r#"<html><body><div class="region-main"><a href="/mod/resource/view.php?id=9">Slides</a></div></body></html>"#;

const TRICKLE_PIECES: usize = 6;
const TRICKLE_PIECE: &[u8] = b"%PDF-0123456789\n";

async fn read_request_head(stream: &mut tokio::net::TcpStream) -> String {
    use tokio::io::AsyncReadExt;

    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Serves the course page normally and the linked file as `body` says
///
/// wiremock always sends complete bodies, so broken transfers need a raw
/// socket.
async fn spawn_file_server(body: FileBody) -> String {
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let request = read_request_head(&mut stream).await;

                if request.starts_with("GET /course/view.php") {
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        FILE_SEED_PAGE.len(),
                        FILE_SEED_PAGE
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    return;
                }

                let length = match body {
                    FileBody::Trickle => TRICKLE_PIECES * TRICKLE_PIECE.len(),
                    FileBody::Truncated | FileBody::Stalled => 100_000,
                };
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    length
                );
                let _ = stream.write_all(head.as_bytes()).await;

                match body {
                    FileBody::Truncated => {
                        let _ = stream.write_all(b"%PDF-partial").await;
                        let _ = stream.flush().await;
                    }
                    FileBody::Stalled => {
                        let _ = stream.write_all(b"%PDF-").await;
                        let _ = stream.flush().await;
                        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                    }
                    FileBody::Trickle => {
                        for _ in 0..TRICKLE_PIECES {
                            let _ = stream.write_all(TRICKLE_PIECE).await;
                            let _ = stream.flush().await;
                            tokio::time::sleep(std::time::Duration::from_millis(400)).await;
                        }
                    }
                }
            });
        }
    });

    format!("http://{}", addr)
}

/// Runs a crawl against `base_url` with a one second stall timeout
async fn crawl_file_server(base_url: &str, dir: &Path) -> moodle_mirror::output::CrawlStatistics {
    let mut config = create_test_config(base_url, dir);
    config.crawler.request_timeout_secs = 1;
    coordinator(&config).run().await.expect("Crawl failed")
}

fn file_dir(dir: &Path, base_url: &str) -> PathBuf {
    let host = host_key(&Url::parse(base_url).unwrap()).unwrap();
    dir.join("course-5")
        .join(format!("http-{}", host))
        .join("mod/resource/view.php")
}

fn dir_entries(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_truncated_download_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let base_url = spawn_file_server(FileBody::Truncated).await;

    let stats = crawl_file_server(&base_url, dir.path()).await;

    assert_eq!(stats.count(ResourceOutcome::SavedPage), 1);
    assert_eq!(stats.count(ResourceOutcome::Failed), 1);

    let files = file_dir(dir.path(), &base_url);
    assert!(!files.join("id-9.pdf").exists());
    assert!(dir_entries(&files).is_empty(), "leftover files: {:?}", dir_entries(&files));
}

#[tokio::test]
async fn test_stalled_download_times_out() {
    let dir = TempDir::new().unwrap();
    let base_url = spawn_file_server(FileBody::Stalled).await;

    let stats = crawl_file_server(&base_url, dir.path()).await;

    assert_eq!(stats.count(ResourceOutcome::Failed), 1);
    let files = file_dir(dir.path(), &base_url);
    assert!(dir_entries(&files).is_empty(), "leftover files: {:?}", dir_entries(&files));
}

#[tokio::test]
async fn test_slow_download_outlasting_timeout_completes() {
    let dir = TempDir::new().unwrap();
    let base_url = spawn_file_server(FileBody::Trickle).await;

    // About 2.4s in total, with no gap longer than the 1s stall timeout
    let stats = crawl_file_server(&base_url, dir.path()).await;

    assert_eq!(stats.count(ResourceOutcome::SavedFile), 1);
    assert_eq!(stats.count(ResourceOutcome::Failed), 0);

    let files = file_dir(dir.path(), &base_url);
    let saved = std::fs::read(files.join("id-9.pdf")).unwrap();
    assert_eq!(saved, TRICKLE_PIECE.repeat(TRICKLE_PIECES));
    assert_eq!(dir_entries(&files), vec!["id-9.pdf".to_string()]);
}
