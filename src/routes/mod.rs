//! HTTP surface of the audio download service

pub mod download;
pub mod files;
pub mod index;

#[cfg(test)]
mod routes_tests;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::SharedState;

pub fn create_app(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/download", post(download::download_handler))
        .route("/files/:filename", get(files::serve_file))
        .route("/healthcheck", get(health_check))
        .fallback(fallback)
        .with_state(state)
}

/// axum handler for any request that fails to match the router routes.
pub async fn fallback(uri: axum::http::Uri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, uri.to_string())
}

pub async fn health_check() -> Result<String, StatusCode> {
    Ok("Health : Ok".into())
}

/// Uniform HTML error fragment. Only ever carries the generic user-safe
/// message; the detail stays in the log.
pub(crate) fn error_fragment(status: StatusCode, message: &str) -> Response {
    (
        status,
        Html(format!(
            "<div class=\"error\"><p>{}</p></div>",
            escape_html(message)
        )),
    )
        .into_response()
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encode a filename for use inside an href.
pub(crate) fn encode_href_component(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
