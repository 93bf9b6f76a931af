//! yt-audio-server - Core Library
//!
//! Web front-end over the yt-dlp extractor: a submitted YouTube video or
//! playlist URL is turned into MP3 file(s) and handed back to the client.

pub mod core;
pub mod routes;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    config::AppConfig,
    downloader::{AudioDownloader, MediaFetcher, YtDlpFetcher},
    models::{AppError, AppResult, DownloadReport, ItemOutcome, PlaylistEntry, UrlKind},
};

use std::sync::Arc;

pub type SharedState = Arc<AppState>;

/// Application state shared between request handlers. Explicitly constructed
/// and passed in; there are no process-wide mutable globals.
pub struct AppState {
    pub config: AppConfig,
    pub downloader: AudioDownloader,
}

impl AppState {
    /// Build the state from a validated configuration, backed by the yt-dlp
    /// binary.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let downloader = AudioDownloader::new(&config)
            .map_err(|e| anyhow::anyhow!("Failed to create downloader: {}", e))?;

        Ok(Self { config, downloader })
    }

    /// Build the state with an explicit downloader (used by tests).
    pub fn with_downloader(config: AppConfig, downloader: AudioDownloader) -> Self {
        Self { config, downloader }
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
