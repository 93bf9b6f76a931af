//! Route tests against an in-process server with a scripted extractor.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use url::Url;

use crate::core::downloader::{AudioDownloader, MediaFetcher};
use crate::core::models::{AppError, AppResult, PlaylistEntry};
use crate::routes::create_app;
use crate::{AppConfig, AppState};

#[derive(Serialize)]
struct FormBody<'a> {
    url: &'a str,
}

/// Scripted extractor: fixed entries, optional per-title failures, optional
/// resolve-time failure. Counts invocations so tests can assert the adapter
/// was never reached.
struct StubFetcher {
    entries: Vec<PlaylistEntry>,
    failing_titles: Vec<String>,
    resolve_error: Option<String>,
    resolve_calls: AtomicUsize,
}

impl StubFetcher {
    fn with_entries(entries: Vec<PlaylistEntry>) -> Self {
        Self {
            entries,
            failing_titles: Vec::new(),
            resolve_error: None,
            resolve_calls: AtomicUsize::new(0),
        }
    }

    fn failing_resolve(detail: &str) -> Self {
        Self {
            entries: Vec::new(),
            failing_titles: Vec::new(),
            resolve_error: Some(detail.to_string()),
            resolve_calls: AtomicUsize::new(0),
        }
    }

    fn failing(mut self, title: &str) -> Self {
        self.failing_titles.push(title.to_string());
        self
    }
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    async fn resolve_entries(&self, _url: &Url, max_items: usize) -> AppResult<Vec<PlaylistEntry>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(detail) = &self.resolve_error {
            return Err(AppError::Extractor(detail.clone()));
        }
        Ok(self.entries.iter().take(max_items).cloned().collect())
    }

    async fn fetch_audio(&self, entry: &PlaylistEntry, dest: &Path) -> AppResult<()> {
        if self.failing_titles.contains(&entry.title) {
            return Err(AppError::Extractor(format!("unavailable: {}", entry.url)));
        }
        std::fs::write(dest, b"mp3-bytes")?;
        Ok(())
    }
}

fn entry(id: &str, title: &str) -> PlaylistEntry {
    PlaylistEntry {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://www.youtube.com/watch?v={id}"),
    }
}

/// Server plus the handles tests need to poke at afterwards.
fn test_server(fetcher: StubFetcher) -> (TestServer, Arc<StubFetcher>, TempDir) {
    let dir = tempdir().unwrap();
    let mut config = AppConfig::default();
    config.download.output_directory = dir.path().to_path_buf();

    let fetcher = Arc::new(fetcher);
    let downloader = AudioDownloader::with_fetcher(&config, fetcher.clone()).unwrap();
    let state = Arc::new(AppState::with_downloader(config, downloader));

    let server = TestServer::new(create_app(state)).unwrap();
    (server, fetcher, dir)
}

#[tokio::test]
async fn index_serves_the_form() {
    let (server, _, _dir) = test_server(StubFetcher::with_entries(Vec::new()));

    let response = server.get("/").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("<form"));
    assert!(body.contains("name=\"url\""));
}

#[tokio::test]
async fn healthcheck_is_ok() {
    let (server, _, _dir) = test_server(StubFetcher::with_entries(Vec::new()));
    server.get("/healthcheck").await.assert_status_ok();
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (server, _, _dir) = test_server(StubFetcher::with_entries(Vec::new()));
    let response = server.get("/no/such/route").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn single_video_comes_back_as_mp3_attachment() {
    let fetcher = StubFetcher::with_entries(vec![entry("aaa", "My Song")]);
    let (server, _, _dir) = test_server(fetcher);

    let response = server
        .post("/download")
        .form(&FormBody {
            url: "https://www.youtube.com/watch?v=aaa",
        })
        .await;

    response.assert_status_ok();
    let content_type = response.header("content-type");
    assert_eq!(content_type, "audio/mpeg");

    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("My Song.mp3"));

    assert_eq!(response.as_bytes().as_ref(), &b"mp3-bytes"[..]);
}

#[tokio::test]
async fn playlist_reports_per_item_results_with_links() {
    let fetcher = StubFetcher::with_entries(vec![
        entry("aaa", "First"),
        entry("bbb", "Second"),
        entry("ccc", "Third"),
    ])
    .failing("Second");
    let (server, _, dir) = test_server(fetcher);

    let response = server
        .post("/download")
        .form(&FormBody {
            url: "https://www.youtube.com/playlist?list=PL123",
        })
        .await;

    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("2 succeeded, 1 failed"));
    assert!(body.contains("/files/First.mp3"));
    assert!(body.contains("/files/Third.mp3"));
    assert!(body.contains("Second"));
    assert!(!body.contains("/files/Second.mp3"));

    // The two completed files exist in the output directory
    assert!(dir.path().join("First.mp3").exists());
    assert!(dir.path().join("Third.mp3").exists());
    assert!(!dir.path().join("Second.mp3").exists());
}

#[tokio::test]
async fn empty_url_is_rejected_before_the_adapter_runs() {
    let (server, fetcher, _dir) = test_server(StubFetcher::with_entries(vec![entry("a", "A")]));

    let response = server.post("/download").form(&FormBody { url: "   " }).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(fetcher.resolve_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_url_is_rejected_before_the_adapter_runs() {
    let (server, fetcher, _dir) = test_server(StubFetcher::with_entries(vec![entry("a", "A")]));

    let response = server
        .post("/download")
        .form(&FormBody { url: "not a url" })
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(fetcher.resolve_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn adapter_failure_yields_the_generic_message_only() {
    let (server, _, _dir) = test_server(StubFetcher::failing_resolve(
        "HTTP 403 from extractor, session token abc123",
    ));

    let response = server
        .post("/download")
        .form(&FormBody {
            url: "https://www.youtube.com/watch?v=aaa",
        })
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text();
    assert!(body.contains("Download failed"));
    assert!(!body.contains("abc123"));
    assert!(!body.contains("403"));
}

#[tokio::test]
async fn same_url_twice_produces_two_results() {
    let fetcher = StubFetcher::with_entries(vec![entry("aaa", "My Song")]);
    let (server, _, dir) = test_server(fetcher);

    for _ in 0..2 {
        let response = server
            .post("/download")
            .form(&FormBody {
                url: "https://www.youtube.com/watch?v=aaa",
            })
            .await;
        response.assert_status_ok();
    }

    let mp3_count = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "mp3"))
        .count();
    assert_eq!(mp3_count, 2);
}

#[tokio::test]
async fn completed_files_can_be_fetched() {
    let (server, _, dir) = test_server(StubFetcher::with_entries(Vec::new()));
    std::fs::write(dir.path().join("My Song.mp3"), b"mp3-bytes").unwrap();

    let response = server.get("/files/My%20Song.mp3").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "audio/mpeg");
    assert_eq!(response.as_bytes().as_ref(), &b"mp3-bytes"[..]);
}

#[tokio::test]
async fn file_route_rejects_suspicious_names() {
    let (server, _, dir) = test_server(StubFetcher::with_entries(Vec::new()));
    std::fs::write(dir.path().join("ok.mp3"), b"x").unwrap();

    for bad in ["missing.mp3", "ok.ogg", "..%2Fok.mp3", "..ok.mp3"] {
        let response = server.get(&format!("/files/{bad}")).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
