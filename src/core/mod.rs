//! Core business logic module
//!
//! Domain models, configuration, and the download orchestration for the
//! audio web service.

pub mod config;
pub mod downloader;
pub mod models;


// Re-export commonly used types
pub use self::config::AppConfig;
pub use self::downloader::AudioDownloader;
