use crate::channels::base::{MessagingChannel, http_client};
use crate::config::MessengerConfig;
use crate::errors::{RelayError, RelayResult};
use crate::message::MediaRef;
use async_trait::async_trait;
use serde_json::json;

/// Facebook Messenger channel (Send API).
pub struct MessengerChannel {
    config: MessengerConfig,
    client: reqwest::Client,
}

impl MessengerChannel {
    pub fn new(config: MessengerConfig) -> Self {
        Self {
            config,
            client: http_client(),
        }
    }

    fn send_error(&self, message: impl Into<String>) -> RelayError {
        RelayError::Send {
            channel: self.name().to_string(),
            message: message.into(),
        }
    }

    fn fetch_error(&self, message: impl Into<String>) -> RelayError {
        RelayError::MediaFetch {
            channel: self.name().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl MessagingChannel for MessengerChannel {
    fn name(&self) -> &'static str {
        "messenger"
    }

    fn max_chunk_width(&self) -> usize {
        self.config.max_chunk_width
    }

    /// Messenger attachments come as pre-signed CDN URLs; no auth header.
    async fn resolve_media(&self, media: &MediaRef) -> RelayResult<Vec<u8>> {
        let url = match media {
            MediaRef::Url(url) => url,
            MediaRef::MediaId(id) => {
                return Err(self.fetch_error(format!("unexpected opaque media id: {id}")));
            }
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.fetch_error(format!("status {} from {}", response.status(), url)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, recipient: &str, text: &str) -> RelayResult<()> {
        let url = format!("{}/v16.0/me/messages", self.config.base_url);
        let payload = json!({
            "recipient": {"id": recipient},
            "messaging_type": "RESPONSE",
            "message": {"text": text},
        });

        let response = self
            .client
            .post(&url)
            .query(&[("access_token", self.config.page_access_token.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.send_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(self.send_error(format!("API error ({status}): {body}")));
        }
        Ok(())
    }
}
