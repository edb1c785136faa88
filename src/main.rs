mod api;
mod config;
mod db;
mod error;
mod services;
mod state;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, StorageProvider};
use crate::db::PgMediaRepository;
use crate::services::assets::AssetStore;
use crate::services::cloudinary::CloudinaryStore;
use crate::services::s3::S3Store;
use crate::services::scratch::ScratchDir;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(load_env_filter(None, EnvFilter::DEFAULT_ENV))
        .init();

    // Load config
    let config = AppConfig::load()?;
    tracing::info!(base_path = %config.server.base_path, "Starting media upload server");

    // Connect to database
    let db = db::create_pool(&config.database.url, config.database.max_connections).await?;
    tracing::info!("Database connected and migrations applied");

    let assets = connect_asset_store(&config).await?;

    let scratch = ScratchDir::create(&config.scratch.dir)
        .await
        .with_context(|| format!("failed to create scratch dir {}", config.scratch.dir))?;
    tracing::info!(dir = %scratch.path().display(), "Scratch storage ready");

    // Build application state
    let state = AppState {
        media: Arc::new(PgMediaRepository::new(db)),
        assets,
        scratch: Arc::new(scratch),
    };

    // Build router
    let app = api::router(&config.server.base_path, config.server.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Load `.env` (or the file at `dotenv_path`) before reading the log filter,
/// so a `RUST_LOG` set there applies.
fn load_env_filter(dotenv_path: Option<&Path>, var: &str) -> EnvFilter {
    let _ = match dotenv_path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new("info"))
}

async fn connect_asset_store(config: &AppConfig) -> anyhow::Result<Arc<dyn AssetStore>> {
    match config.storage.provider {
        StorageProvider::Cloudinary => {
            let cloudinary = config
                .storage
                .cloudinary
                .clone()
                .context("storage.provider is cloudinary but storage.cloudinary is not set")?;
            tracing::info!(cloud_name = %cloudinary.cloud_name, "Cloudinary configured");
            Ok(Arc::new(CloudinaryStore::new(reqwest::Client::new(), cloudinary)))
        }
        StorageProvider::S3 => {
            let s3_config = config
                .storage
                .s3
                .clone()
                .context("storage.provider is s3 but storage.s3 is not set")?;
            tracing::info!(endpoint = %s3_config.endpoint, bucket = %s3_config.bucket, "S3 connected");
            Ok(Arc::new(S3Store::connect(s3_config).await))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_reads_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, "REELBOX_TEST_LOG=debug\n").unwrap();

        let filter = load_env_filter(Some(&dotenv), "REELBOX_TEST_LOG");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        let dir = tempfile::tempdir().unwrap();
        let filter = load_env_filter(Some(&dir.path().join("missing.env")), "REELBOX_UNSET_LOG");
        assert_eq!(filter.to_string(), "info");
    }
}
