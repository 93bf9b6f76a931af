//! Core data models for the audio download service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A download request as submitted through the web form.
///
/// Lives only for the duration of one HTTP request. `url` defaults to empty
/// so a missing form field is rejected by validation, not by
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
}

/// Classification of a submitted URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlKind {
    SingleVideo,
    Playlist,
}

/// One video entry within a playlist, processed independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Explicit per-item result. A failing playlist item becomes a `Failed`
/// variant in the report instead of aborting the remaining items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ItemOutcome {
    Completed { title: String, file: PathBuf },
    Failed { title: String, reason: String },
}

impl ItemOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Aggregated result of one download request. Not persisted beyond the
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadReport {
    pub requested_url: String,
    pub kind: UrlKind,
    pub items: Vec<ItemOutcome>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl DownloadReport {
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_completed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.len() - self.completed_count()
    }

    /// Paths of all successfully produced files, in item order.
    pub fn completed_files(&self) -> Vec<&PathBuf> {
        self.items
            .iter()
            .filter_map(|i| match i {
                ItemOutcome::Completed { file, .. } => Some(file),
                ItemOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("extractor error: {0}")]
    Extractor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// User-safe message. Cause categories are deliberately not
    /// distinguishable from the outside; the raw detail goes to the log only.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Please provide a valid video or playlist URL.",
            _ => "Download failed. Please check the URL and try again.",
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
