use anyhow::{Context, Result};
use clap::Parser;
use image_resizer::app::App;
use image_resizer::models::Config;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Debug, Parser)]
#[command(name = "image-resizer")]
#[command(about = "Store uploaded images and produce resized copies")]
struct CliArgs {
    /// Path to the JSON configuration file.
    #[arg(long, value_name = "PATH", default_value = "cfg.json")]
    config: PathBuf,
}

/// Console gets everything the filter allows, the log file only errors.
fn init_tracing(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_resizer=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::ERROR),
        )
        .init();

    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    init_tracing(&config.log_file_path)?;

    if !args.config.exists() {
        warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
    }

    info!("Starting image-resizer");

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
