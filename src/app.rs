//! Application wiring: ingestion service, resize worker and HTTP server.

use crate::ingest::{IngestService, IngestionService};
use crate::models::Config;
use crate::server;
use crate::Result;
use actix_web::{middleware, web, HttpServer};
use std::sync::Arc;
use tracing::info;

pub struct App {
    config: Config,
    ingest: Arc<dyn IngestService>,
}

impl App {
    /// Build an app around an existing ingestion implementation.
    ///
    /// This is primarily useful for integration tests that inject mocks.
    pub fn with_services(config: Config, ingest: Arc<dyn IngestService>) -> Self {
        Self { config, ingest }
    }

    /// Create the image directories and start the resize worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        config.prepare_directories()?;
        info!(
            "Storing originals in {} and {}x{} derivatives in {}",
            config.image_directory.display(),
            config.image_width,
            config.image_height,
            config.resized_image_directory.display()
        );

        let ingest = IngestionService::new(config.service_config())?;
        Ok(Self::with_services(config, Arc::new(ingest)))
    }

    pub fn ingest(&self) -> Arc<dyn IngestService> {
        self.ingest.clone()
    }

    /// Serve HTTP on `0.0.0.0:<port>` until the server shuts down.
    pub async fn run(self) -> Result<()> {
        let ingest = self.ingest;
        let max_upload_bytes = self.config.max_upload_bytes;

        let http_server = HttpServer::new(move || {
            actix_web::App::new()
                .wrap(middleware::Logger::default())
                .app_data(web::Data::from(ingest.clone()))
                .configure(|cfg| server::configure(cfg, max_upload_bytes))
        })
        .bind(("0.0.0.0", self.config.port))?;

        info!("Server is started on {} port", self.config.port);
        http_server.run().await?;
        info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::MockIngestService;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_new_creates_directories() {
        let dir = tempdir().unwrap();
        let config = Config {
            image_directory: dir.path().join("in"),
            resized_image_directory: dir.path().join("out"),
            ..Config::default()
        };

        let _app = App::new(config).unwrap();

        assert!(dir.path().join("in").is_dir());
        assert!(dir.path().join("out").is_dir());
    }

    #[tokio::test]
    async fn test_with_services_exposes_ingest() {
        let mock = MockIngestService::new();
        let app = App::with_services(Config::default(), Arc::new(mock.clone()));

        assert!(app.ingest().fetch_from_url("http://localhost/a.png").await);
        assert_eq!(mock.get_fetch_calls().len(), 1);
    }
}
