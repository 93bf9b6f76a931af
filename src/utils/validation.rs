//! URL and input validation utilities

use anyhow::{anyhow, Result};
use url::Url;

/// Validate the submitted URL shape. Anything beyond this (unreachable
/// videos, region locks, malformed ids) is the extractor's call.
pub fn validate_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| anyhow!("Invalid URL format: {}", e))
}

/// Check if URL is a plausible video URL (http or https).
pub fn is_valid_video_url(url: &str) -> bool {
    if let Ok(parsed) = Url::parse(url) {
        let scheme = parsed.scheme();
        scheme == "http" || scheme == "https"
    } else {
        false
    }
}

fn is_youtube_host(host: &str) -> bool {
    let host = host.to_lowercase();
    host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtu.be"
}

/// A URL references a playlist when it points at YouTube and carries a
/// `list=` query parameter.
pub fn is_playlist_url(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if !is_youtube_host(host) {
        return false;
    }
    url.query_pairs().any(|(key, _)| key == "list")
}
