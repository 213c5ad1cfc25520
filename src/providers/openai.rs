use crate::config::BackendConfig;
use crate::providers::base::CompletionBackend;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Chat-completions backend speaking the OpenAI wire format. The base URL is
/// configurable so OpenAI-compatible services can act as fallbacks through
/// the same implementation.
pub struct OpenAiBackend {
    name: String,
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            name: config.name.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            client: Client::builder()
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn parse_response(&self, json: &Value) -> Result<String> {
        let content = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .with_context(|| format!("no completion content in {} response", self.name))?;
        Ok(content.to_string())
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt},
            ],
        });

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("failed to reach {} API", self.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            anyhow::bail!("{} API error ({status}): {body}", self.name);
        }

        let json: Value = response
            .json()
            .await
            .with_context(|| format!("invalid JSON from {} API", self.name))?;
        self.parse_response(&json)
    }
}
