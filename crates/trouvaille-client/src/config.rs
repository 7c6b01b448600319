//! Client configuration for the external collaborators.
//!
//! Loaded from environment variables with working defaults for local
//! development against a `trouvaille-server` on localhost.

/// Endpoints for the object store and the category suggestion service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the trouvaille-server object store.
    /// Env: `TROUVAILLE_SERVER_URL`
    /// Default: `http://127.0.0.1:8080`
    pub object_store_url: String,

    /// URL of the hosted category suggestion endpoint.
    /// Env: `SUGGEST_API_URL`
    /// Default: `http://127.0.0.1:8080/suggest` (dev stub)
    pub suggest_api_url: String,

    /// Bearer token for the suggestion endpoint, if it requires one.
    /// Env: `SUGGEST_API_KEY`
    /// Default: none.
    pub suggest_api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            object_store_url: "http://127.0.0.1:8080".to_string(),
            suggest_api_url: "http://127.0.0.1:8080/suggest".to_string(),
            suggest_api_key: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TROUVAILLE_SERVER_URL") {
            config.object_store_url = url;
        }

        if let Ok(url) = std::env::var("SUGGEST_API_URL") {
            config.suggest_api_url = url;
        }

        if let Ok(key) = std::env::var("SUGGEST_API_KEY") {
            if !key.is_empty() {
                config.suggest_api_key = Some(key);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let config = ClientConfig::default();
        assert!(config.object_store_url.starts_with("http://127.0.0.1"));
        assert!(config.suggest_api_key.is_none());
    }
}
