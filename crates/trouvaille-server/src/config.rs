//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server starts with zero configuration
//! for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Filesystem path where uploaded photos are stored.
    /// Env: `BLOB_STORAGE_PATH`
    /// Default: `./blobs`
    pub blob_storage_path: PathBuf,

    /// Base URL clients use to retrieve uploaded photos. Returned verbatim
    /// in upload responses, so it must be reachable from the client.
    /// Env: `PUBLIC_BASE_URL`
    /// Default: `http://127.0.0.1:8080`
    pub public_base_url: String,

    /// Maximum accepted upload size in bytes (5 MiB). Clients compress
    /// photos to roughly 1 MiB before sending.
    pub max_blob_size: usize,

    /// Human-readable name for this server instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Trouvaille Object Store"`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            blob_storage_path: PathBuf::from("./blobs"),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            max_blob_size: 5 * 1024 * 1024,
            instance_name: "Trouvaille Object Store".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("BLOB_STORAGE_PATH") {
            config.blob_storage_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            config.public_base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("MAX_BLOB_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_blob_size = n;
            }
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.max_blob_size, 5 * 1024 * 1024);
        assert_eq!(config.public_base_url, "http://127.0.0.1:8080");
    }
}
