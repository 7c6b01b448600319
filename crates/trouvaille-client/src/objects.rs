//! Object store client.
//!
//! One call: upload bytes, get back a retrievable URL.  The server stores
//! blobs content-addressed, so re-uploading identical bytes is harmless.

use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    #[allow(dead_code)]
    hash: String,
}

/// HTTP client for the trouvaille-server blob API.
#[derive(Clone)]
pub struct ObjectStoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl ObjectStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Upload a blob; returns the URL it can be fetched from.
    pub async fn upload(&self, bytes: Vec<u8>) -> Result<String, ClientError> {
        let size = bytes.len();
        let url = format!("{}/blobs", self.base_url.trim_end_matches('/'));

        let resp = self
            .http
            .post(&url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ClientError::Upload(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClientError::Upload(format!(
                "server returned {}",
                resp.status()
            )));
        }

        let body: UploadResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Upload(format!("bad upload response: {e}")))?;

        debug!(size, url = %body.url, "blob uploaded");
        Ok(body.url)
    }
}
