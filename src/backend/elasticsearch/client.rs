use crate::config::BackendConfig;
use crate::error::{AppError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// One sub-request of a multi-search call: header line plus body line
#[derive(Debug, Clone)]
pub struct MultiSearchEntry {
    pub header: Value,
    pub body: Value,
}

/// Thin HTTP client for the bulk multi-search endpoint
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl ElasticsearchClient {
    /// Create a client from the backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Send all entries as one `_msearch` round trip and return the
    /// positional sub-responses
    pub async fn msearch(&self, entries: &[MultiSearchEntry]) -> Result<Vec<Value>> {
        let mut body = String::new();
        for entry in entries {
            body.push_str(&serde_json::to_string(&entry.header)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(&entry.body)?);
            body.push('\n');
        }

        debug!(
            url = %self.base_url,
            sub_requests = entries.len(),
            "Sending multi-search request"
        );

        let response = self
            .client
            .post(format!("{}/_msearch", self.base_url))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            return Err(AppError::Backend(format!(
                "Multi-search request returned status {}: {}",
                status,
                if body.is_empty() {
                    "No response body"
                } else {
                    &body
                }
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Invalid multi-search response: {}", e)))?;

        payload
            .get("responses")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                AppError::Backend("Multi-search response is missing 'responses'".to_string())
            })
    }
}
