//! Audio download orchestration over the external yt-dlp extractor.
//!
//! The extractor does all the heavy lifting (network retrieval, format
//! negotiation, transcoding). This module classifies the submitted URL,
//! expands playlists, runs items sequentially and turns per-item failures
//! into explicit `ItemOutcome::Failed` values so one broken playlist entry
//! never aborts the rest.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, error, info};
use url::Url;

use crate::core::config::{AppConfig, AudioConfig, DownloadConfig};
use crate::core::models::{
    AppError, AppResult, DownloadReport, ItemOutcome, PlaylistEntry, UrlKind,
};
use crate::utils::{file_utils, validation};

/// Seam to the external extractor. Production uses [`YtDlpFetcher`]; tests
/// substitute a scripted implementation.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Flat-expand a URL into downloadable entries. A single video yields
    /// exactly one entry; a playlist yields one per item, capped at
    /// `max_items`.
    async fn resolve_entries(&self, url: &Url, max_items: usize) -> AppResult<Vec<PlaylistEntry>>;

    /// Download one entry's audio to `dest`.
    async fn fetch_audio(&self, entry: &PlaylistEntry, dest: &Path) -> AppResult<()>;
}

/// Orchestrates one download request end to end.
pub struct AudioDownloader {
    download: DownloadConfig,
    audio: AudioConfig,
    fetcher: Arc<dyn MediaFetcher>,
}

impl AudioDownloader {
    /// Create a downloader backed by the yt-dlp binary.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let fetcher = Arc::new(YtDlpFetcher::new(
            config.download.yt_dlp_path.clone(),
            config.audio.clone(),
        ));
        Self::with_fetcher(config, fetcher)
    }

    /// Create a downloader with an explicit fetcher implementation.
    pub fn with_fetcher(config: &AppConfig, fetcher: Arc<dyn MediaFetcher>) -> AppResult<Self> {
        if config.download.playlist_max_items == 0 {
            return Err(AppError::Config(
                "playlist_max_items must be greater than 0".to_string(),
            ));
        }

        file_utils::ensure_output_directory(&config.download.output_directory)?;

        Ok(Self {
            download: config.download.clone(),
            audio: config.audio.clone(),
            fetcher,
        })
    }

    /// Process one submitted URL: validate, expand, download sequentially,
    /// aggregate per-item outcomes.
    pub async fn download(&self, raw_url: &str) -> AppResult<DownloadReport> {
        let trimmed = raw_url.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("no URL provided".to_string()));
        }
        if !validation::is_valid_video_url(trimmed) {
            return Err(AppError::InvalidInput(format!(
                "not an http(s) URL: {trimmed}"
            )));
        }
        let url = validation::validate_url(trimmed)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let kind = if validation::is_playlist_url(&url) {
            UrlKind::Playlist
        } else {
            UrlKind::SingleVideo
        };

        let started_at = chrono::Utc::now();
        info!("Resolving entries for {} ({:?})", url, kind);

        let entries = self
            .fetcher
            .resolve_entries(&url, self.download.playlist_max_items)
            .await?;

        if entries.is_empty() {
            return Err(AppError::Extractor(format!(
                "no downloadable entries found for {url}"
            )));
        }

        let mut items = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            info!(
                "Processing ({}/{}): {}",
                index + 1,
                entries.len(),
                entry.title
            );

            match self.fetch_entry(entry).await {
                Ok(file) => {
                    info!("Completed: {} -> {}", entry.title, file.display());
                    items.push(ItemOutcome::Completed {
                        title: entry.title.clone(),
                        file,
                    });
                }
                Err(err) => {
                    // Best effort: log the detail, record the failure, keep going.
                    error!("Download failed for {}: {}", entry.url, err);
                    items.push(ItemOutcome::Failed {
                        title: entry.title.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let report = DownloadReport {
            requested_url: trimmed.to_string(),
            kind,
            items,
            started_at,
            finished_at: chrono::Utc::now(),
        };

        info!(
            "Download summary for {}: {} succeeded, {} failed",
            report.requested_url,
            report.completed_count(),
            report.failed_count()
        );

        Ok(report)
    }

    async fn fetch_entry(&self, entry: &PlaylistEntry) -> AppResult<PathBuf> {
        let dest = file_utils::unique_output_path(
            &self.download.output_directory,
            &entry.title,
            &self.audio.format,
            &entry.url,
        )?;

        match self.fetcher.fetch_audio(entry, &dest).await {
            Ok(()) => Ok(dest),
            Err(err) => {
                // Failed items leave nothing behind, including the reserved
                // placeholder.
                let _ = tokio::fs::remove_file(&dest).await;
                Err(err)
            }
        }
    }
}

/// Production fetcher shelling out to the yt-dlp binary.
pub struct YtDlpFetcher {
    yt_dlp_path: PathBuf,
    audio: AudioConfig,
}

impl YtDlpFetcher {
    pub fn new(yt_dlp_path: PathBuf, audio: AudioConfig) -> Self {
        Self { yt_dlp_path, audio }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn resolve_entries(&self, url: &Url, max_items: usize) -> AppResult<Vec<PlaylistEntry>> {
        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-single-json", "--flat-playlist", "--no-warnings"])
            .args(["--playlist-end", &max_items.to_string()])
            .arg(url.as_str())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_extractor_error(&stderr, url.as_str()));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::Extractor(format!("unparseable extractor output: {e}")))?;

        parse_entries(&info, url.as_str())
    }

    async fn fetch_audio(&self, entry: &PlaylistEntry, dest: &Path) -> AppResult<()> {
        // The orchestrator picked the final stem (sanitized, so free of
        // template `%` directives); yt-dlp fills in the post-processing
        // extension and overwrites the reserved placeholder.
        let template = dest.with_extension("%(ext)s");

        let output = Command::new(&self.yt_dlp_path)
            .args(["--extract-audio", "--audio-format", &self.audio.format])
            .args(["--audio-quality", &self.audio.quality])
            .args(["--no-playlist", "--no-warnings", "--force-overwrites"])
            .arg("-o")
            .arg(&template)
            .arg(&entry.url)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_extractor_error(&stderr, &entry.url));
        }

        let size = tokio::fs::metadata(dest).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(AppError::Extractor(format!(
                "extractor reported success but produced no output at {}",
                dest.display()
            )));
        }

        Ok(())
    }
}

/// Turn flat extractor JSON into playlist entries. Single videos yield one
/// entry; playlist entries without a URL get a watch URL constructed from
/// the video id, and null entries (deleted or private videos) are skipped.
fn parse_entries(info: &serde_json::Value, requested_url: &str) -> AppResult<Vec<PlaylistEntry>> {
    let title_of = |value: &serde_json::Value| {
        value
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("Unknown Title")
            .to_string()
    };

    if info.get("_type").and_then(|t| t.as_str()) == Some("playlist") {
        let Some(raw_entries) = info.get("entries").and_then(|e| e.as_array()) else {
            return Err(AppError::Extractor(format!(
                "playlist without entries: {requested_url}"
            )));
        };

        let mut entries = Vec::new();
        for raw in raw_entries {
            if raw.is_null() {
                continue;
            }
            let id = raw.get("id").and_then(|i| i.as_str());
            let entry_url = raw
                .get("url")
                .and_then(|u| u.as_str())
                .map(str::to_string)
                .or_else(|| id.map(|id| format!("https://www.youtube.com/watch?v={id}")));

            let Some(entry_url) = entry_url else {
                continue;
            };

            entries.push(PlaylistEntry {
                id: id.unwrap_or_default().to_string(),
                title: title_of(raw),
                url: entry_url,
            });
        }
        return Ok(entries);
    }

    if let Some(id) = info.get("id").and_then(|i| i.as_str()) {
        let url = info
            .get("webpage_url")
            .and_then(|u| u.as_str())
            .unwrap_or(requested_url)
            .to_string();

        return Ok(vec![PlaylistEntry {
            id: id.to_string(),
            title: title_of(info),
            url,
        }]);
    }

    Err(AppError::Extractor(format!(
        "no media information for {requested_url}"
    )))
}

/// Map yt-dlp stderr to an error with a useful logged detail. The user only
/// ever sees `AppError::user_message()`.
fn classify_extractor_error(stderr: &str, url: &str) -> AppError {
    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        return AppError::Extractor(format!("video unavailable or restricted: {url}"));
    }
    if stderr.contains("is not a valid URL") {
        return AppError::InvalidInput(format!("extractor rejected URL: {url}"));
    }

    let detail = stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("extractor exited with an error");
    AppError::Extractor(format!("{url}: {detail}"))
}
