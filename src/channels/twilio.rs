use crate::channels::base::{MessagingChannel, http_client};
use crate::config::TwilioConfig;
use crate::errors::{RelayError, RelayResult};
use crate::message::MediaRef;
use async_trait::async_trait;
use tracing::debug;

const API_BASE: &str = "https://api.twilio.com";

pub struct TwilioChannel {
    config: TwilioConfig,
    api_base: String,
    client: reqwest::Client,
}

impl TwilioChannel {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            api_base: API_BASE.to_string(),
            client: http_client(),
        }
    }

    #[cfg(test)]
    fn with_api_base(config: TwilioConfig, api_base: String) -> Self {
        Self {
            config,
            api_base,
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
impl MessagingChannel for TwilioChannel {
    fn name(&self) -> &'static str {
        "twilio"
    }

    fn max_chunk_width(&self) -> usize {
        self.config.max_chunk_width
    }

    /// Twilio hands out direct media URLs; fetching them requires the same
    /// basic-auth credentials as the REST API.
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
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
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
        debug!("twilio media fetched: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn send(&self, recipient: &str, text: &str) -> RelayResult<()> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.config.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("Body", text),
                ("To", recipient),
                ("From", self.config.phone_number.as_str()),
            ])
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
