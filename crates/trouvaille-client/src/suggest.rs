//! Category suggestion wrapper.
//!
//! A thin prompt template around a hosted language model: one
//! request/response round trip per user click, no retry, no caching, no
//! rate limiting.  The ≥10-character input contract is the caller's to
//! enforce ([`trouvaille_shared::validation::validate_suggestion_input`]);
//! this wrapper only shapes the request and extracts the single label.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;

/// Request body sent to the suggestion endpoint.
#[derive(Debug, Serialize)]
struct SuggestRequest<'a> {
    prompt: &'a str,
}

/// Schema-constrained response: exactly one category label.
#[derive(Debug, Deserialize)]
struct SuggestResponse {
    category: String,
}

/// Render the prompt for an item description.
pub fn render_prompt(description: &str) -> String {
    format!(
        "You are a helpful assistant that suggests a category for a lost or \
         found item based on the description.\n\n\
         Description: {description}\n\n\
         Suggest a category for this item:\n"
    )
}

/// Client for the hosted suggestion endpoint.
#[derive(Clone)]
pub struct SuggestionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SuggestionClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// Ask the model for a category label for `description`.
    ///
    /// Any upstream failure -- transport, non-success status, malformed or
    /// empty response -- surfaces as [`ClientError::Suggestion`].  Never
    /// blocks or alters form submission.
    pub async fn suggest(&self, description: &str) -> Result<String, ClientError> {
        let prompt = render_prompt(description);

        let mut req = self
            .http
            .post(&self.endpoint)
            .json(&SuggestRequest { prompt: &prompt });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Suggestion(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClientError::Suggestion(format!(
                "server returned {}",
                resp.status()
            )));
        }

        let body: SuggestResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Suggestion(format!("bad response: {e}")))?;

        if body.category.trim().is_empty() {
            return Err(ClientError::Suggestion("empty category".to_string()));
        }

        debug!(category = %body.category, "category suggested");
        Ok(body.category)
    }
}
