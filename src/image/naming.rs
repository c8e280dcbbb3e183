//! File naming for persisted originals.
//!
//! Uploads and URL fetches reuse the client-visible name, so two requests
//! with the same name write to the same path and the later one wins.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NamingPolicy {
    original_dir: PathBuf,
}

impl NamingPolicy {
    pub fn new(original_dir: impl Into<PathBuf>) -> Self {
        Self {
            original_dir: original_dir.into(),
        }
    }

    /// Fresh `<uuid>.<token>` path for a decoded base64 payload.
    pub fn name_for_decoded_payload(&self, format_token: &str) -> PathBuf {
        let file_name = format!("{}.{}", Uuid::new_v4(), format_token.to_lowercase());
        self.original_dir.join(file_name)
    }

    /// Path for an uploaded file. Only the final component of the client's
    /// name is kept.
    pub fn name_for_uploaded_file(&self, original_filename: &str) -> Result<PathBuf> {
        let file_name = Path::new(original_filename)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidFileName(original_filename.to_string()))?;

        Ok(self.original_dir.join(file_name))
    }

    /// Path named after the last non-empty segment of the URL path.
    pub fn name_for_fetched_url(&self, url: &str) -> Result<PathBuf> {
        let parsed =
            reqwest::Url::parse(url).map_err(|_| Error::InvalidFileName(url.to_string()))?;

        let segment = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .filter(|s| *s != "." && *s != "..")
            .ok_or_else(|| Error::InvalidFileName(url.to_string()))?;

        Ok(self.original_dir.join(segment))
    }
}

/// Substring after the last `.` of the file name, or `""` when there is none.
pub fn format_token_from_path(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

/// Same as [`format_token_from_path`] for a URL, ignoring query and fragment.
pub fn format_token_from_url(url: &str) -> String {
    let path = reqwest::Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    format_token_from_path(Path::new(&path)).to_lowercase()
}
