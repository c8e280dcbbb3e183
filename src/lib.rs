//! Image ingestion and resize service
//!
//! Accepts images as base64 JSON payloads, multipart uploads or remote URLs,
//! stores each original and produces a fixed-size derivative through a
//! single background resize worker.

pub mod app;
pub mod error;
pub mod image;
pub mod ingest;
pub mod models;
pub mod server;
pub mod worker;

pub use error::{Error, ErrorKind, Result};
