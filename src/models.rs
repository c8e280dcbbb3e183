//! Data models and structures
//!
//! Defines the resize job handed to the worker, the service and application
//! configuration, and the JSON shapes exchanged over HTTP.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Unit of work carried from ingestion to the resize worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeJob {
    pub source_path: PathBuf,
    pub format_token: String,
}

impl ResizeJob {
    pub fn new(source_path: PathBuf, format_token: impl Into<String>) -> Self {
        Self {
            source_path,
            format_token: format_token.into(),
        }
    }
}

/// Settings the pipeline needs; read-only once the service is built.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub width: u32,
    pub height: u32,
    pub original_dir: PathBuf,
    pub resized_dir: PathBuf,
    pub fetch_timeout: Duration,
    /// `None` waits on a decode/resize for as long as it takes.
    pub resize_timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn new(
        width: u32,
        height: u32,
        original_dir: impl Into<PathBuf>,
        resized_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            width,
            height,
            original_dir: original_dir.into(),
            resized_dir: resized_dir.into(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            resize_timeout: None,
        }
    }

    pub fn with_resize_timeout(mut self, timeout: Duration) -> Self {
        self.resize_timeout = Some(timeout);
        self
    }
}

// HTTP request/response models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestJson {
    /// Absent or `null` reads as no images.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<EncodedImage>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedImage {
    pub format: String,
    #[serde(rename = "base_64")]
    pub base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseJson {
    pub status: u16,
    pub message: String,
}

impl ResponseJson {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(200, "Success.")
    }
}

// Configuration
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DIMENSION: u32 = 100;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub log_file_path: PathBuf,
    pub image_directory: PathBuf,
    pub resized_image_directory: PathBuf,
    pub image_width: u32,
    pub image_height: u32,
    pub fetch_timeout_secs: u64,
    pub resize_timeout_secs: Option<u64>,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_file_path: PathBuf::from("info.log"),
            image_directory: PathBuf::from("images"),
            resized_image_directory: PathBuf::from("images_resize"),
            image_width: DEFAULT_DIMENSION,
            image_height: DEFAULT_DIMENSION,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            resize_timeout_secs: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load the JSON config at `path`, falling back to defaults when the file
    /// does not exist, then apply `RESIZER_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(port) = env_parse::<u16>("RESIZER_PORT")? {
            self.port = port;
        }
        if let Some(width) = env_parse::<u32>("RESIZER_IMAGE_WIDTH")? {
            self.image_width = width;
        }
        if let Some(height) = env_parse::<u32>("RESIZER_IMAGE_HEIGHT")? {
            self.image_height = height;
        }
        if let Ok(dir) = std::env::var("RESIZER_IMAGE_DIRECTORY") {
            self.image_directory = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("RESIZER_RESIZED_IMAGE_DIRECTORY") {
            self.resized_image_directory = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("RESIZER_LOG_FILE") {
            self.log_file_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(Error::Config(format!(
                "Target size must be non-zero, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        if self.image_directory == self.resized_image_directory {
            return Err(Error::Config(
                "Original and resized image directories must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Create both image directories if they are missing.
    pub fn prepare_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.image_directory)?;
        std::fs::create_dir_all(&self.resized_image_directory)?;
        Ok(())
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            width: self.image_width,
            height: self.image_height,
            original_dir: self.image_directory.clone(),
            resized_dir: self.resized_image_directory.clone(),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            resize_timeout: self.resize_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(None),
    }
}
