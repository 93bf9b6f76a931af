//! Filename and output directory helpers

use crate::core::models::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const MAX_STEM_LEN: usize = 120;
const MAX_COLLISION_ATTEMPTS: u32 = 64;

/// Make a video title safe to use as a filename. Path separators, control
/// characters, characters rejected by common filesystems and `%` (which the
/// extractor's output template would interpret) become `_`.
pub fn sanitize_filename(title: &str) -> String {
    let mut stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Dot-prefixed names hide files on unix
    while stem.starts_with('.') {
        stem.remove(0);
    }

    if stem.len() > MAX_STEM_LEN {
        // Byte length cap; cut must land on a char boundary
        let mut cut = MAX_STEM_LEN;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        stem.truncate(cut);
    }

    if stem.is_empty() {
        stem = "audio".to_string();
    }
    stem
}

/// Resolve and reserve an output path for a title. The path is claimed with
/// `create_new`, so concurrent requests can never resolve to the same file.
/// On collision a short SHA-256 suffix derived from the source URL and
/// attempt counter is appended, so repeated downloads of the same video
/// coexist.
pub fn unique_output_path(
    dir: &Path,
    title: &str,
    ext: &str,
    source_url: &str,
) -> AppResult<PathBuf> {
    let stem = sanitize_filename(title);

    let candidate = dir.join(format!("{stem}.{ext}"));
    if try_reserve(&candidate)? {
        return Ok(candidate);
    }

    for attempt in 1..=MAX_COLLISION_ATTEMPTS {
        let digest = Sha256::digest(format!("{source_url}:{attempt}").as_bytes());
        let suffix = &hex::encode(digest)[..8];
        let candidate = dir.join(format!("{stem}-{suffix}.{ext}"));
        if try_reserve(&candidate)? {
            return Ok(candidate);
        }
    }

    Err(AppError::Internal(format!(
        "could not find a free filename for '{stem}.{ext}' in {}",
        dir.display()
    )))
}

/// Atomically claim a path by creating it empty. `false` means someone else
/// holds it already.
fn try_reserve(path: &Path) -> AppResult<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Create the output directory if it does not exist.
pub fn ensure_output_directory(dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}
