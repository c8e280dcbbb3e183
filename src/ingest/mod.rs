//! Image ingestion: base64 payloads, multipart uploads and URL fetches
//!
//! Every path writes the original image first, then hands a resize job to
//! the worker and only returns once the worker has accepted it. Failures are
//! logged and reported as `false` (or a failed file name), never raised.
//! Dropping a call while it waits on the worker does not cancel the work.

pub mod form;
pub mod mock;
pub mod service;

pub use form::{UploadForm, UploadedFile};
pub use mock::MockIngestService;
pub use service::IngestionService;

use async_trait::async_trait;

/// Multipart field carrying the uploaded images.
pub const IMAGES_FIELD: &str = "images";

#[async_trait]
pub trait IngestService: Send + Sync {
    async fn decode_from_base64(&self, payload: &str, format_token: &str) -> bool;

    /// Returns `(all_succeeded, failed_file_names)` in form order.
    async fn consume_multipart(&self, form: UploadForm) -> (bool, Vec<String>);

    async fn fetch_from_url(&self, url: &str) -> bool;
}
