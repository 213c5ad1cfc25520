use crate::errors::RelayResult;
use crate::message::MediaRef;
use async_trait::async_trait;

/// A messaging provider the relay can receive from and reply to.
///
/// Selected once per job from the channel tag on the canonical message;
/// pipeline code never branches on provider strings.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Maximum characters per outbound message for this provider.
    fn max_chunk_width(&self) -> usize;

    /// Resolve a media reference to raw bytes. Direct URLs are fetched with
    /// this channel's auth context; opaque ids go through the provider's
    /// lookup endpoint first. No retries — any failure aborts the owning job.
    async fn resolve_media(&self, media: &MediaRef) -> RelayResult<Vec<u8>>;

    /// Send one text segment to a recipient.
    async fn send(&self, recipient: &str, text: &str) -> RelayResult<()>;
}

/// Shared reqwest client settings for channel API calls.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
