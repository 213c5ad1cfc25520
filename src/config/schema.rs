use serde::{Deserialize, Serialize};

fn default_chunk_width() -> usize {
    1600
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "accountSid")]
    pub account_sid: String,
    #[serde(default, rename = "authToken")]
    pub auth_token: String,
    /// Sending number, e.g. "whatsapp:+14155238886" or a plain SMS number.
    #[serde(default, rename = "phoneNumber")]
    pub phone_number: String,
    /// Public webhook URL as configured in the Twilio console. When set,
    /// inbound requests must carry a valid X-Twilio-Signature.
    #[serde(default, rename = "webhookUrl")]
    pub webhook_url: String,
    #[serde(default = "default_chunk_width", rename = "maxChunkWidth")]
    pub max_chunk_width: usize,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account_sid: String::new(),
            auth_token: String::new(),
            phone_number: String::new(),
            webhook_url: String::new(),
            max_chunk_width: default_chunk_width(),
        }
    }
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_graph_version() -> String {
    "v16.0".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_graph_base_url", rename = "baseUrl")]
    pub base_url: String,
    #[serde(default = "default_graph_version", rename = "apiVersion")]
    pub api_version: String,
    #[serde(default, rename = "phoneNumberId")]
    pub phone_number_id: String,
    #[serde(default, rename = "accessToken")]
    pub access_token: String,
    /// Secret echoed back during the subscription verification handshake.
    #[serde(default, rename = "verifyToken")]
    pub verify_token: String,
    #[serde(default = "default_chunk_width", rename = "maxChunkWidth")]
    pub max_chunk_width: usize,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_graph_base_url(),
            api_version: default_graph_version(),
            phone_number_id: String::new(),
            access_token: String::new(),
            verify_token: String::new(),
            max_chunk_width: default_chunk_width(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_graph_base_url", rename = "baseUrl")]
    pub base_url: String,
    #[serde(default, rename = "pageAccessToken")]
    pub page_access_token: String,
    #[serde(default, rename = "verifyToken")]
    pub verify_token: String,
    #[serde(default = "default_chunk_width", rename = "maxChunkWidth")]
    pub max_chunk_width: usize,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_graph_base_url(),
            page_access_token: String::new(),
            verify_token: String::new(),
            max_chunk_width: default_chunk_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub messenger: MessengerConfig,
}

/// One completion backend. Listed in fallback order, primary first.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_completion_base_url", rename = "baseUrl")]
    pub base_url: String,
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompletionConfig {
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

fn default_transcription_base_url() -> String {
    "https://api.groq.com/openai/v1/audio/transcriptions".to_string()
}

fn default_transcription_model() -> String {
    "whisper-large-v3".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_transcription_base_url", rename = "baseUrl")]
    pub base_url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            base_url: default_transcription_base_url(),
            model: default_transcription_model(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Process configuration. Built once at startup and shared read-only across
/// all concurrent jobs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.completion.backends.is_empty() {
            anyhow::bail!("at least one completion backend must be configured");
        }
        for backend in &self.completion.backends {
            if backend.name.is_empty() {
                anyhow::bail!("completion backend is missing a name");
            }
            if backend.api_key.is_empty() {
                anyhow::bail!("completion backend '{}' has no apiKey", backend.name);
            }
        }
        let c = &self.channels;
        if !c.twilio.enabled && !c.whatsapp.enabled && !c.messenger.enabled {
            anyhow::bail!("no messaging channel is enabled");
        }
        if c.twilio.enabled
            && (c.twilio.account_sid.is_empty()
                || c.twilio.auth_token.is_empty()
                || c.twilio.phone_number.is_empty())
        {
            anyhow::bail!("twilio channel enabled but accountSid/authToken/phoneNumber missing");
        }
        if c.whatsapp.enabled
            && (c.whatsapp.phone_number_id.is_empty() || c.whatsapp.access_token.is_empty())
        {
            anyhow::bail!("whatsapp channel enabled but phoneNumberId/accessToken missing");
        }
        if c.messenger.enabled && c.messenger.page_access_token.is_empty() {
            anyhow::bail!("messenger channel enabled but pageAccessToken missing");
        }
        Ok(())
    }
}

// Keep tokens out of debug output.
macro_rules! redacted_debug {
    ($ty:ty) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($ty), " {{ enabled: {}, .. }}"), self.enabled)
            }
        }
    };
}

redacted_debug!(TwilioConfig);
redacted_debug!(WhatsAppConfig);
redacted_debug!(MessengerConfig);
redacted_debug!(TranscriptionConfig);

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BackendConfig {{ name: {:?}, model: {:?}, .. }}",
            self.name, self.model
        )
    }
}
