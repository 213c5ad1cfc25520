use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messaging providers this relay understands. Selected by webhook route,
/// never inferred from payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Twilio,
    WhatsApp,
    Messenger,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Twilio => "twilio",
            ChannelKind::WhatsApp => "whatsapp",
            ChannelKind::Messenger => "messenger",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a voice note attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaRef {
    /// Direct download URL; the owning channel supplies the auth context.
    Url(String),
    /// Opaque media id that must be resolved to a short-lived URL first.
    MediaId(String),
}

/// What the sender actually sent. The enum guarantees a message carries
/// exactly one of text or media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Text(String),
    Audio(MediaRef),
}

/// Canonical inbound message, independent of the originating provider.
/// Lives for exactly one background job and is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: ChannelKind,
    pub sender: String,
    pub body: MessageBody,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn text(channel: ChannelKind, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel,
            sender: sender.into(),
            body: MessageBody::Text(text.into()),
            received_at: Utc::now(),
        }
    }

    pub fn audio(channel: ChannelKind, sender: impl Into<String>, media: MediaRef) -> Self {
        Self {
            channel,
            sender: sender.into(),
            body: MessageBody::Audio(media),
            received_at: Utc::now(),
        }
    }
}

/// One provider-safe segment of a completion reply.
///
/// Chunks of a reply partition the original string: indices are contiguous
/// from 0 and concatenating the texts reproduces the reply verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundChunk {
    pub text: String,
    pub index: usize,
    pub total: usize,
}
