use thiserror::Error;

/// Typed error hierarchy for the relay pipeline.
///
/// Use at stage boundaries (payload decoding, media fetch, transcription,
/// completion, outbound send). Leaf functions keep using `anyhow::Result` —
/// the `Internal` variant converts via `?`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Malformed webhook payload: {0}")]
    Parse(String),

    #[error("Media fetch failed on {channel}: {message}")]
    MediaFetch { channel: String, message: String },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("All completion backends failed: {0}")]
    Completion(String),

    #[error("Send failed on {channel}: {message}")]
    Send { channel: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Pipeline stage name used for job failure logs.
    pub fn stage(&self) -> &'static str {
        match self {
            RelayError::Parse(_) => "parse",
            RelayError::MediaFetch { .. } => "media_fetch",
            RelayError::Transcription(_) => "transcription",
            RelayError::Completion(_) => "completion",
            RelayError::Send { .. } => "send",
            RelayError::Config(_) => "config",
            RelayError::Internal(_) => "internal",
        }
    }
}
