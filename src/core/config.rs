//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix for configuration environment variables, e.g.
/// `YTAUDIO__DOWNLOAD__OUTPUT_DIRECTORY`.
pub const ENV_PREFIX: &str = "YTAUDIO";

/// Environment variable pointing at an explicit config file.
pub const ENV_CONFIG_FILE: &str = "YTAUDIO_CONFIG";

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub download: DownloadConfig,
    pub audio: AudioConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Download orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory MP3 files are written to
    pub output_directory: PathBuf,
    /// Path or name of the yt-dlp binary
    pub yt_dlp_path: PathBuf,
    /// Upper bound on playlist entries processed per request
    pub playlist_max_items: usize,
}

/// Audio extraction preferences passed through to yt-dlp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub format: String,  // "mp3", "aac", "opus", etc.
    pub quality: String, // yt-dlp audio quality, e.g. "192"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            download: DownloadConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("downloads"),
            yt_dlp_path: PathBuf::from("yt-dlp"),
            playlist_max_items: 100,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            format: "mp3".to_string(),
            quality: "192".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load configuration at process start: built-in defaults, overridden by
    /// an optional config file, overridden by `YTAUDIO__*` environment
    /// variables.
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = Self::config_file_path() {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config: AppConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to assemble configuration sources")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Validate configuration before serving requests.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        if self.download.playlist_max_items == 0 {
            anyhow::bail!("download.playlist_max_items must be greater than 0");
        }
        if self.download.yt_dlp_path.as_os_str().is_empty() {
            anyhow::bail!("download.yt_dlp_path must not be empty");
        }
        if self.audio.format.is_empty() {
            anyhow::bail!("audio.format must not be empty");
        }
        Ok(())
    }

    /// Explicit `YTAUDIO_CONFIG` path, else the platform config directory.
    fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
            return Some(PathBuf::from(path));
        }

        ProjectDirs::from("com", "yt-audio-server", "yt-audio-server")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
