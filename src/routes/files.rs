//! Completed-file retrieval

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::routes::error_fragment;
use crate::utils::file_utils;
use crate::SharedState;

/// Serve a previously produced MP3 from the output directory. Only names
/// that sanitize to themselves and carry the configured audio extension are
/// accepted, so traversal attempts never reach the filesystem.
pub async fn serve_file(
    State(state): State<SharedState>,
    UrlPath(filename): UrlPath<String>,
) -> Response {
    if !is_safe_filename(&state.config.audio.format, &filename) {
        warn!("rejected file request: {filename:?}");
        return error_fragment(StatusCode::NOT_FOUND, "File not found.");
    }

    let path = state.config.download.output_directory.join(&filename);
    match tokio::fs::read(&path).await {
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
        Err(_) => error_fragment(StatusCode::NOT_FOUND, "File not found."),
    }
}

fn is_safe_filename(audio_ext: &str, filename: &str) -> bool {
    let Some(stem) = filename.strip_suffix(&format!(".{audio_ext}")) else {
        return false;
    };
    !stem.is_empty()
        && !filename.contains("..")
        && file_utils::sanitize_filename(stem) == stem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_filename() {
        assert!(is_safe_filename("mp3", "My Song.mp3"));
        assert!(is_safe_filename("mp3", "Song-1a2b3c4d.mp3"));

        assert!(!is_safe_filename("mp3", "../etc/passwd"));
        assert!(!is_safe_filename("mp3", "..mp3"));
        assert!(!is_safe_filename("mp3", "a/b.mp3"));
        assert!(!is_safe_filename("mp3", "song.ogg"));
        assert!(!is_safe_filename("mp3", ".mp3"));
    }
}
