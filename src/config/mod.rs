mod loader;
mod schema;

pub use loader::{DEFAULT_CONFIG_FILE, load_config};
pub use schema::{
    BackendConfig, ChannelsConfig, CompletionConfig, Config, GatewayConfig, MessengerConfig,
    TranscriptionConfig, TwilioConfig, WhatsAppConfig,
};
