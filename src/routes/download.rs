//! Download submission handler

use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::path::Path;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::models::{AppError, DownloadReport, DownloadRequest, ItemOutcome, UrlKind};
use crate::routes::{encode_href_component, error_fragment, escape_html};
use crate::utils::validation;
use crate::SharedState;

/// Accept the submitted URL, invoke the downloader, and map the result to a
/// response. Input shape problems are rejected here, before the extractor is
/// ever invoked; everything else is the downloader's call.
pub async fn download_handler(
    State(state): State<SharedState>,
    Form(request): Form<DownloadRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    let url = request.url.trim().to_string();

    if url.is_empty() {
        warn!("[{request_id}] rejected request: no URL provided");
        let err = AppError::InvalidInput("no URL provided".to_string());
        return error_fragment(StatusCode::BAD_REQUEST, err.user_message());
    }
    if !validation::is_valid_video_url(&url) {
        warn!("[{request_id}] rejected request: malformed URL {url:?}");
        let err = AppError::InvalidInput(format!("malformed URL: {url}"));
        return error_fragment(StatusCode::BAD_REQUEST, err.user_message());
    }

    info!("[{request_id}] download requested: {url}");

    match state.downloader.download(&url).await {
        Ok(report) if report.completed_count() == 0 => {
            error!(
                "[{request_id}] all {} item(s) failed for {url}",
                report.items.len()
            );
            let err = AppError::Extractor("no item completed".to_string());
            error_fragment(StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
        }
        Ok(report) => {
            info!(
                "[{request_id}] finished {url}: {} succeeded, {} failed",
                report.completed_count(),
                report.failed_count()
            );
            report_response(request_id, report).await
        }
        Err(err) => {
            // Raw detail goes to the log; the user gets the generic message.
            error!("[{request_id}] download failed for {url}: {err}");
            let status = match err {
                AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_fragment(status, err.user_message())
        }
    }
}

/// A lone completed single video is streamed back directly; playlists get an
/// HTML fragment listing per-item results with download links.
async fn report_response(request_id: Uuid, report: DownloadReport) -> Response {
    if report.kind == UrlKind::SingleVideo {
        if let [ItemOutcome::Completed { file, .. }] = report.items.as_slice() {
            return file_attachment(request_id, file).await;
        }
    }
    playlist_fragment(&report)
}

async fn file_attachment(request_id: Uuid, file: &Path) -> Response {
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio.mp3".to_string());

    match tokio::fs::read(file).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "audio/mpeg".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename.replace('"', "_")),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!(
                "[{request_id}] completed file {} unreadable: {err}",
                file.display()
            );
            let err = AppError::Io(err);
            error_fragment(StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
        }
    }
}

fn playlist_fragment(report: &DownloadReport) -> Response {
    let mut rows = String::new();
    for item in &report.items {
        match item {
            ItemOutcome::Completed { title, file } => {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                rows.push_str(&format!(
                    "<li class=\"completed\">&#10003; <a href=\"/files/{}\">{}</a></li>\n",
                    encode_href_component(&name),
                    escape_html(title)
                ));
            }
            ItemOutcome::Failed { title, .. } => {
                rows.push_str(&format!(
                    "<li class=\"failed\">&#10007; {} &mdash; download failed</li>\n",
                    escape_html(title)
                ));
            }
        }
    }

    let body = format!(
        "<div class=\"report\">\n<p>{} succeeded, {} failed</p>\n<ul>\n{rows}</ul>\n</div>",
        report.completed_count(),
        report.failed_count()
    );

    (StatusCode::OK, Html(body)).into_response()
}
