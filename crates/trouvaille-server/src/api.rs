use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, Method},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::blob_store::BlobStore;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub blob_store: Arc<BlobStore>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = state.config.max_blob_size;

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/blobs", post(blob_upload))
        .route("/blobs/:hash", get(blob_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    max_blob_size: usize,
}

#[derive(Serialize)]
struct BlobUploadResponse {
    hash: String,
    url: String,
    size: usize,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        max_blob_size: state.config.max_blob_size,
    })
}

/// Accept a raw photo body and return its content address plus the public
/// URL clients embed in item reports.
async fn blob_upload(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BlobUploadResponse>, ServerError> {
    let hash = state.blob_store.store_blob(&body).await?;
    let url = format!("{}/blobs/{hash}", state.config.public_base_url);

    info!(hash = %hash, size = body.len(), "Blob uploaded via API");

    Ok(Json(BlobUploadResponse {
        hash,
        url,
        size: body.len(),
    }))
}

async fn blob_download(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let data = state.blob_store.get_blob(&hash).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], data))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
