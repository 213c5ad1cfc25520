use crate::config::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "voxrelay.json";

/// Load configuration from a JSON file, apply environment overrides for
/// secrets, and validate. With no file present the defaults plus env
/// overrides are used (useful for container deployments configured purely
/// through the environment).
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let path = config_path.unwrap_or(default_path);

    let mut config = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;
    Ok(config)
}

/// Environment variables take precedence over file values (env > file).
fn apply_env_overrides(config: &mut Config) {
    if let Ok(v) = std::env::var("TWILIO_ACCOUNT_SID") {
        config.channels.twilio.account_sid = v;
    }
    if let Ok(v) = std::env::var("TWILIO_AUTH_TOKEN") {
        config.channels.twilio.auth_token = v;
    }
    if let Ok(v) = std::env::var("WHATSAPP_ACCESS_TOKEN") {
        config.channels.whatsapp.access_token = v;
    }
    if let Ok(v) = std::env::var("WHATSAPP_VERIFY_TOKEN") {
        config.channels.whatsapp.verify_token = v;
    }
    if let Ok(v) = std::env::var("MESSENGER_PAGE_ACCESS_TOKEN") {
        config.channels.messenger.page_access_token = v;
    }
    if let Ok(v) = std::env::var("TRANSCRIPTION_API_KEY") {
        config.transcription.api_key = v;
    }
    // First backend is the primary; a single env key targets it.
    if let Ok(v) = std::env::var("COMPLETION_API_KEY")
        && let Some(primary) = config.completion.backends.first_mut()
    {
        primary.api_key = v;
    }
}
