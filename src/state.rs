use crate::channels::{self, MessagingChannel};
use crate::config::Config;
use crate::message::ChannelKind;
use crate::providers::{self, FallbackChain};
use crate::transcription::Transcriber;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a webhook handler or background job needs, built once at
/// startup. All fields are read-only; concurrent jobs share them via `Arc`.
pub struct AppState {
    pub config: Config,
    pub channels: HashMap<ChannelKind, Arc<dyn MessagingChannel>>,
    pub completion: FallbackChain,
    pub transcriber: Transcriber,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let channels = channels::build_channels(&config);
        let completion = providers::build_chain(&config.completion);
        let transcriber = Transcriber::new(config.transcription.clone());
        Self {
            config,
            channels,
            completion,
            transcriber,
        }
    }
}
