use super::{IngestService, UploadForm, IMAGES_FIELD};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockIngestService {
    decode_calls: Arc<Mutex<Vec<(String, String)>>>,
    upload_calls: Arc<Mutex<Vec<Vec<String>>>>,
    fetch_calls: Arc<Mutex<Vec<String>>>,
    failing_formats: Arc<Mutex<Vec<String>>>,
    failing_uploads: Arc<Mutex<Vec<String>>>,
    fetch_succeeds: Arc<Mutex<bool>>,
}

impl MockIngestService {
    pub fn new() -> Self {
        Self {
            decode_calls: Arc::new(Mutex::new(Vec::new())),
            upload_calls: Arc::new(Mutex::new(Vec::new())),
            fetch_calls: Arc::new(Mutex::new(Vec::new())),
            failing_formats: Arc::new(Mutex::new(Vec::new())),
            failing_uploads: Arc::new(Mutex::new(Vec::new())),
            fetch_succeeds: Arc::new(Mutex::new(true)),
        }
    }

    /// Make `decode_from_base64` fail for this format token.
    pub fn with_failing_format(self, format: &str) -> Self {
        self.failing_formats.lock().unwrap().push(format.to_string());
        self
    }

    /// Make `consume_multipart` report this file name as failed.
    pub fn with_failing_upload(self, file_name: &str) -> Self {
        self.failing_uploads
            .lock()
            .unwrap()
            .push(file_name.to_string());
        self
    }

    pub fn with_fetch_result(self, succeeds: bool) -> Self {
        *self.fetch_succeeds.lock().unwrap() = succeeds;
        self
    }

    pub fn get_decode_calls(&self) -> Vec<(String, String)> {
        self.decode_calls.lock().unwrap().clone()
    }

    pub fn get_upload_calls(&self) -> Vec<Vec<String>> {
        self.upload_calls.lock().unwrap().clone()
    }

    pub fn get_fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

impl Default for MockIngestService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestService for MockIngestService {
    async fn decode_from_base64(&self, payload: &str, format_token: &str) -> bool {
        self.decode_calls
            .lock()
            .unwrap()
            .push((payload.to_string(), format_token.to_string()));

        !self
            .failing_formats
            .lock()
            .unwrap()
            .iter()
            .any(|f| f == format_token)
    }

    async fn consume_multipart(&self, form: UploadForm) -> (bool, Vec<String>) {
        let names: Vec<String> = form
            .files(IMAGES_FIELD)
            .map(|file| file.file_name.clone())
            .collect();
        self.upload_calls.lock().unwrap().push(names.clone());

        let failing = self.failing_uploads.lock().unwrap();
        let failed: Vec<String> = names
            .into_iter()
            .filter(|name| failing.contains(name))
            .collect();
        (failed.is_empty(), failed)
    }

    async fn fetch_from_url(&self, url: &str) -> bool {
        self.fetch_calls.lock().unwrap().push(url.to_string());
        *self.fetch_succeeds.lock().unwrap()
    }
}
