pub mod base;
pub mod chunk;
pub mod messenger;
pub mod twilio;
pub mod whatsapp;

pub use base::MessagingChannel;

use crate::config::Config;
use crate::message::ChannelKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Build one channel instance per enabled provider. The map is constructed
/// once at startup and shared read-only with every job.
pub fn build_channels(config: &Config) -> HashMap<ChannelKind, Arc<dyn MessagingChannel>> {
    let mut channels: HashMap<ChannelKind, Arc<dyn MessagingChannel>> = HashMap::new();

    if config.channels.twilio.enabled {
        channels.insert(
            ChannelKind::Twilio,
            Arc::new(twilio::TwilioChannel::new(config.channels.twilio.clone())),
        );
        info!("twilio channel enabled");
    }
    if config.channels.whatsapp.enabled {
        channels.insert(
            ChannelKind::WhatsApp,
            Arc::new(whatsapp::WhatsAppChannel::new(
                config.channels.whatsapp.clone(),
            )),
        );
        info!("whatsapp channel enabled");
    }
    if config.channels.messenger.enabled {
        channels.insert(
            ChannelKind::Messenger,
            Arc::new(messenger::MessengerChannel::new(
                config.channels.messenger.clone(),
            )),
        );
        info!("messenger channel enabled");
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn only_enabled_channels_are_built() {
        let mut config = Config::default();
        config.channels.whatsapp.enabled = true;
        let channels = build_channels(&config);
        assert_eq!(channels.len(), 1);
        assert!(channels.contains_key(&ChannelKind::WhatsApp));
        assert!(!channels.contains_key(&ChannelKind::Twilio));
    }

    #[test]
    fn channel_names_match_kinds() {
        let mut config = Config::default();
        config.channels.twilio.enabled = true;
        config.channels.messenger.enabled = true;
        let channels = build_channels(&config);
        assert_eq!(channels[&ChannelKind::Twilio].name(), "twilio");
        assert_eq!(channels[&ChannelKind::Messenger].name(), "messenger");
    }
}
