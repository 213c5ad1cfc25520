use crate::channels::MessagingChannel;
use crate::channels::chunk::chunk;
use crate::errors::{RelayError, RelayResult};
use crate::message::{InboundMessage, MessageBody};
use crate::state::AppState;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Schedule one background job for a canonical message and return
/// immediately. The webhook handler never observes the job's outcome; job
/// failures are logged here with their pipeline stage so they cannot vanish
/// silently.
pub fn spawn(state: Arc<AppState>, message: InboundMessage) {
    let job_id = Uuid::new_v4();
    tokio::spawn(async move {
        debug!(%job_id, channel = %message.channel, "job started");
        match process(&state, message).await {
            Ok(()) => debug!(%job_id, "job finished"),
            Err(e) => error!(%job_id, stage = e.stage(), "job failed: {e}"),
        }
    });
}

/// Run the pipeline stages for one message, strictly in sequence:
/// media acquisition (audio only) -> transcription -> completion ->
/// chunking -> ordered dispatch. The first unrecoverable error aborts the
/// job; nothing is sent after an abort.
pub async fn process(state: &AppState, message: InboundMessage) -> RelayResult<()> {
    let channel = state
        .channels
        .get(&message.channel)
        .ok_or_else(|| RelayError::Config(format!("channel {} not enabled", message.channel)))?
        .clone();

    let prompt = match message.body {
        MessageBody::Text(text) => text,
        MessageBody::Audio(media) => {
            let audio = channel.resolve_media(&media).await?;
            let text = state.transcriber.transcribe(&audio).await?;
            info!(channel = %message.channel, "voice note transcribed ({} chars)", text.len());
            text
        }
    };

    let result = state.completion.complete(&prompt).await?;
    debug!(backend = %result.backend, "completion received ({} chars)", result.text.len());

    deliver(channel.as_ref(), &message.sender, &result.text).await;
    Ok(())
}

/// Send the reply to its origin channel as ordered chunks. Chunks go out one
/// at a time in index order — the receiving client renders arrival order as
/// message order. Delivery is best-effort per chunk: a failed chunk is
/// logged and the rest still go out.
pub async fn deliver(channel: &dyn MessagingChannel, recipient: &str, reply: &str) -> usize {
    let chunks = chunk(reply, channel.max_chunk_width());
    if chunks.is_empty() {
        debug!("empty reply, nothing to deliver");
        return 0;
    }

    let mut delivered = 0;
    for piece in &chunks {
        match channel.send(recipient, &piece.text).await {
            Ok(()) => delivered += 1,
            Err(e) => error!(
                chunk = piece.index,
                total = piece.total,
                "chunk delivery failed: {e}"
            ),
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::base::MessagingChannel;
    use crate::config::Config;
    use crate::errors::RelayError;
    use crate::message::{ChannelKind, InboundMessage, MediaRef};
    use crate::providers::{CompletionBackend, FallbackChain};
    use crate::transcription::Transcriber;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Channel that records every send and can fail selected chunk indices.
    struct RecordingChannel {
        width: usize,
        fail_on: Option<usize>,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingChannel {
        fn new(width: usize) -> Self {
            Self {
                width,
                fail_on: None,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(width: usize, index: usize) -> Self {
            Self {
                width,
                fail_on: Some(index),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn max_chunk_width(&self) -> usize {
            self.width
        }

        async fn resolve_media(&self, _media: &MediaRef) -> crate::errors::RelayResult<Vec<u8>> {
            Err(RelayError::MediaFetch {
                channel: "recording".into(),
                message: "not supported in this mock".into(),
            })
        }

        async fn send(&self, _recipient: &str, text: &str) -> crate::errors::RelayResult<()> {
            let attempt_index = self.sent.lock().unwrap().len();
            if self.fail_on == Some(attempt_index) {
                self.sent.lock().unwrap().push(String::new());
                return Err(RelayError::Send {
                    channel: "recording".into(),
                    message: "boom".into(),
                });
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct FixedBackend {
        name: &'static str,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            match self.reply {
                Some(r) => Ok(r.to_string()),
                None => Err(anyhow::anyhow!("down")),
            }
        }
    }

    fn state_with(
        channel: Arc<RecordingChannel>,
        backends: Vec<Arc<dyn CompletionBackend>>,
    ) -> AppState {
        let mut channels: HashMap<ChannelKind, Arc<dyn MessagingChannel>> = HashMap::new();
        channels.insert(ChannelKind::Twilio, channel);
        AppState {
            config: Config::default(),
            channels,
            completion: FallbackChain::new(backends),
            transcriber: Transcriber::new(Default::default()),
        }
    }

    #[tokio::test]
    async fn chunks_are_sent_in_index_order() {
        // Reply splits into three chunks at width 8
        let channel = Arc::new(RecordingChannel::new(8));
        let sent = deliver(channel.as_ref(), "+1555", "aaa bbb ccc ddd eee").await;
        assert_eq!(sent, 3);
        let recorded = channel.sent();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded.concat(), "aaa bbb ccc ddd eee");
        // Strictly increasing positions within the original reply
        assert!(recorded[0].starts_with("aaa"));
        assert!(recorded[2].ends_with("eee"));
    }

    #[tokio::test]
    async fn failed_chunk_does_not_abort_the_rest() {
        let channel = Arc::new(RecordingChannel::failing_on(8, 1));
        let sent = deliver(channel.as_ref(), "+1555", "aaa bbb ccc ddd eee").await;
        assert_eq!(sent, 2);
        // Three attempts were made despite the middle failure
        assert_eq!(channel.sent().len(), 3);
    }

    #[tokio::test]
    async fn text_message_flows_to_ordered_sends() {
        let channel = Arc::new(RecordingChannel::new(1600));
        let state = state_with(
            channel.clone(),
            vec![Arc::new(FixedBackend {
                name: "primary",
                reply: Some("the reply"),
            })],
        );

        process(
            &state,
            InboundMessage::text(ChannelKind::Twilio, "+1555", "hi"),
        )
        .await
        .unwrap();

        assert_eq!(channel.sent(), vec!["the reply".to_string()]);
    }

    #[tokio::test]
    async fn completion_failure_sends_nothing() {
        let channel = Arc::new(RecordingChannel::new(1600));
        let state = state_with(
            channel.clone(),
            vec![
                Arc::new(FixedBackend {
                    name: "primary",
                    reply: None,
                }),
                Arc::new(FixedBackend {
                    name: "fallback",
                    reply: None,
                }),
            ],
        );

        let err = process(
            &state,
            InboundMessage::text(ChannelKind::Twilio, "+1555", "hi"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RelayError::Completion(_)));
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn media_fetch_failure_aborts_before_completion() {
        let channel = Arc::new(RecordingChannel::new(1600));
        let state = state_with(
            channel.clone(),
            vec![Arc::new(FixedBackend {
                name: "primary",
                reply: Some("never sent"),
            })],
        );

        let err = process(
            &state,
            InboundMessage::audio(
                ChannelKind::Twilio,
                "+1555",
                MediaRef::Url("https://example.com/a.ogg".into()),
            ),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RelayError::MediaFetch { .. }));
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_channel_is_config_error() {
        let channel = Arc::new(RecordingChannel::new(1600));
        let state = state_with(
            channel,
            vec![Arc::new(FixedBackend {
                name: "primary",
                reply: Some("x"),
            })],
        );

        let err = process(
            &state,
            InboundMessage::text(ChannelKind::Messenger, "psid", "hi"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
