use super::{IngestService, UploadForm, UploadedFile, IMAGES_FIELD};
use crate::image::{
    decode_bytes, format_token_from_path, format_token_from_url, resolve_format, write_image,
    NamingPolicy,
};
use crate::models::{ResizeJob, ServiceConfig};
use crate::worker::{JobObserver, JobSender, NoopObserver, ResizeWorker};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

/// Ingestion front of the pipeline, owning the sender side of the worker.
#[derive(Clone)]
pub struct IngestionService {
    naming: NamingPolicy,
    sender: JobSender,
    http: Client,
}

impl IngestionService {
    /// Build the service and start its resize worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: ServiceConfig, observer: Arc<dyn JobObserver>) -> Result<Self> {
        let http = Client::builder().timeout(config.fetch_timeout).build()?;
        let naming = NamingPolicy::new(config.original_dir.clone());
        let worker = ResizeWorker::spawn(config, observer);

        Ok(Self {
            naming,
            sender: worker.sender,
            http,
        })
    }

    async fn try_decode_from_base64(&self, payload: &str, format_token: &str) -> Result<PathBuf> {
        let format = resolve_format(format_token)?;
        let bytes = STANDARD.decode(payload)?;
        let path = self.naming.name_for_decoded_payload(format_token);

        tokio::task::spawn_blocking({
            let path = path.clone();
            move || {
                let image = decode_bytes(&bytes, format)?;
                write_image(&image, &path, format)
            }
        })
        .await
        .map_err(|e| Error::TaskJoin(format!("Decode task join error: {}", e)))??;

        self.sender
            .submit(ResizeJob::new(path.clone(), format_token))
            .await?;
        Ok(path)
    }

    async fn store_upload(&self, file: &UploadedFile) -> Result<PathBuf> {
        let mut reader = file.open().await?;
        let path = self.naming.name_for_uploaded_file(&file.file_name)?;

        let copied: Result<()> = async {
            let mut dst = tokio::fs::File::create(&path).await?;
            tokio::io::copy(&mut reader, &mut dst).await?;
            dst.flush().await?;
            Ok::<(), Error>(())
        }
        .await;
        if let Err(e) = copied {
            remove_partial(&path).await;
            return Err(e);
        }

        let format_token = format_token_from_path(&path).to_string();
        self.sender
            .submit(ResizeJob::new(path.clone(), format_token))
            .await?;
        Ok(path)
    }

    async fn try_fetch_from_url(&self, url: &str) -> Result<PathBuf> {
        let mut response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let path = self.naming.name_for_fetched_url(url)?;

        let streamed: Result<()> = async {
            let mut file = tokio::fs::File::create(&path).await?;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<(), Error>(())
        }
        .await;
        if let Err(e) = streamed {
            remove_partial(&path).await;
            return Err(e);
        }

        self.sender
            .submit(ResizeJob::new(path.clone(), format_token_from_url(url)))
            .await?;
        Ok(path)
    }
}

/// Run an ingestion on its own task and wait for it.
///
/// Once an original is on disk its job must reach the worker, so the work
/// keeps going even if the caller stops waiting.
async fn detached<F, T>(work: F) -> Result<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| Error::TaskJoin(format!("Ingest task join error: {}", e)))
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Failed to remove partial file {}: {}", path.display(), e);
    }
}

#[async_trait]
impl IngestService for IngestionService {
    async fn decode_from_base64(&self, payload: &str, format_token: &str) -> bool {
        let service = self.clone();
        let payload = payload.to_string();
        let token = format_token.to_string();
        let stored = detached(async move {
            service.try_decode_from_base64(&payload, &token).await
        })
        .await
        .and_then(|stored| stored);

        match stored {
            Ok(path) => {
                info!("Stored decoded {} image at {}", format_token, path.display());
                true
            }
            Err(e) => {
                error!("Base64 image ({}) rejected: {}", format_token, e);
                false
            }
        }
    }

    async fn consume_multipart(&self, form: UploadForm) -> (bool, Vec<String>) {
        let names: Vec<String> = form
            .files(IMAGES_FIELD)
            .map(|file| file.file_name.clone())
            .collect();
        let service = self.clone();

        let consumed = detached(async move {
            let mut failed = Vec::new();
            for file in form.files(IMAGES_FIELD) {
                match service.store_upload(file).await {
                    Ok(path) => info!("Stored upload {} at {}", file.file_name, path.display()),
                    Err(e) => {
                        error!("Upload {} failed: {}", file.file_name, e);
                        failed.push(file.file_name.clone());
                    }
                }
            }
            failed
        })
        .await;

        let failed = match consumed {
            Ok(failed) => failed,
            Err(e) => {
                error!("Multipart upload aborted: {}", e);
                names
            }
        };
        (failed.is_empty(), failed)
    }

    async fn fetch_from_url(&self, url: &str) -> bool {
        let service = self.clone();
        let target = url.to_string();
        let fetched = detached(async move { service.try_fetch_from_url(&target).await })
            .await
            .and_then(|fetched| fetched);

        match fetched {
            Ok(path) => {
                info!("Stored {} at {}", url, path.display());
                true
            }
            Err(e) => {
                error!("Fetching {} failed: {}", url, e);
                false
            }
        }
    }
}
