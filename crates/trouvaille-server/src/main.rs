//! # trouvaille-server
//!
//! Photo object store for the lost-and-found application.
//!
//! This binary provides:
//! - **Content-addressed blob storage** for compressed report photos
//!   (stored on disk under the BLAKE3 hash of their bytes)
//! - **REST API** (axum) for health checks, instance info, and blob
//!   upload/download
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod blob_store;
mod config;
mod error;
mod rate_limit;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::blob_store::BlobStore;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,trouvaille_server=debug")),
        )
        .init();

    info!("Starting Trouvaille object store v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let blob_store = Arc::new(
        BlobStore::new(config.blob_storage_path.clone(), config.max_blob_size).await?,
    );

    let rate_limiter = RateLimiter::default();

    let app_state = AppState {
        blob_store,
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    let http_addr = config.http_addr;
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
