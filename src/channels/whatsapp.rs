use crate::channels::base::{MessagingChannel, http_client};
use crate::config::WhatsAppConfig;
use crate::errors::{RelayError, RelayResult};
use crate::message::MediaRef;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// WhatsApp Cloud API channel (Meta graph endpoints).
pub struct WhatsAppChannel {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            client: http_client(),
        }
    }

    fn graph_url(&self, tail: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url, self.config.api_version, tail
        )
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

    /// Opaque media ids must be exchanged for a short-lived download URL
    /// before the bytes can be fetched.
    async fn lookup_media_url(&self, media_id: &str) -> RelayResult<String> {
        let url = self.graph_url(media_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.fetch_error(format!(
                "media lookup for {media_id} returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;
        body["url"]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| self.fetch_error(format!("media lookup for {media_id} had no url field")))
    }

    async fn fetch_url(&self, url: &str) -> RelayResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.fetch_error(format!("status {} from media url", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;
        debug!("whatsapp media fetched: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MessagingChannel for WhatsAppChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    fn max_chunk_width(&self) -> usize {
        self.config.max_chunk_width
    }

    async fn resolve_media(&self, media: &MediaRef) -> RelayResult<Vec<u8>> {
        match media {
            MediaRef::Url(url) => self.fetch_url(url).await,
            MediaRef::MediaId(id) => {
                let url = self.lookup_media_url(id).await?;
                self.fetch_url(&url).await
            }
        }
    }

    async fn send(&self, recipient: &str, text: &str) -> RelayResult<()> {
        let url = self.graph_url(&format!("{}/messages", self.config.phone_number_id));
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": recipient,
            "type": "text",
            "text": {
                "preview_url": true,
                "body": text,
            },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
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
