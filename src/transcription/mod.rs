use crate::config::TranscriptionConfig;
use crate::errors::{RelayError, RelayResult};
use anyhow::Context;
use std::time::Duration;
use tracing::debug;

const TRANSCRIBE_TIMEOUT_SECS: u64 = 60;

/// Speech-to-text adapter for an OpenAI-style `audio/transcriptions`
/// endpoint. The engine itself is an opaque external service; this component
/// only stages the audio and speaks the multipart request contract.
pub struct Transcriber {
    config: TranscriptionConfig,
    client: reqwest::Client,
}

impl Transcriber {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(TRANSCRIBE_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Transcribe a voice note. The audio is staged in a named temp file so
    /// concurrent jobs never collide on a path, and the multipart upload is
    /// built from that staged file; the file is removed on every exit path
    /// when the guard drops. No size or duration cap is enforced.
    pub async fn transcribe(&self, audio: &[u8]) -> RelayResult<String> {
        if !self.config.enabled {
            return Err(RelayError::Transcription(
                "transcription is disabled".into(),
            ));
        }
        if self.config.api_key.is_empty() {
            return Err(RelayError::Transcription(
                "transcription apiKey not configured".into(),
            ));
        }

        let staged = tempfile::Builder::new()
            .prefix("voxrelay-audio-")
            .suffix(".ogg")
            .tempfile()
            .context("failed to stage audio for transcription")?;
        tokio::fs::write(staged.path(), audio)
            .await
            .context("failed to write staged audio")?;

        let file_name = staged
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.ogg")
            .to_string();
        debug!("staged {} bytes of audio as {}", audio.len(), file_name);

        let staged_bytes = tokio::fs::read(staged.path())
            .await
            .context("failed to read staged audio")?;
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(staged_bytes).file_name(file_name),
            )
            .text("model", self.config.model.clone());

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::Transcription(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(RelayError::Transcription(format!(
                "engine returned {status}: {body}"
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RelayError::Transcription(e.to_string()))?;
        let text = data["text"]
            .as_str()
            .ok_or_else(|| RelayError::Transcription("engine response had no text field".into()))?
            .to_string();

        // `staged` drops here, deleting the temp file on success and failure
        // paths alike.
        Ok(text)
    }
}
