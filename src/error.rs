//! Error handling and custom error types
//!
//! Provides unified error handling across the pipeline using thiserror.
//! Ingestion converts these into boolean results at the point of failure,
//! the worker reports them to its observer; none of them is retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Resize worker is not accepting jobs")]
    WorkerClosed,

    #[error("Resize exceeded {0:?}")]
    ResizeTimeout(std::time::Duration),

    #[error("Background task failed: {0}")]
    TaskJoin(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used for logging and by job observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Decode,
    Io,
    Network,
    Worker,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownFormat(_) | Error::InvalidFileName(_) => ErrorKind::Validation,
            Error::Base64(_) | Error::Image(_) | Error::Serialization(_) => ErrorKind::Decode,
            Error::Io(_) => ErrorKind::Io,
            Error::Http(_) | Error::HttpStatus { .. } => ErrorKind::Network,
            Error::WorkerClosed | Error::ResizeTimeout(_) | Error::TaskJoin(_) => {
                ErrorKind::Worker
            }
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
