//! App-level configuration for the Google provider.
//!
//! User-provided OAuth credentials and target calendar, stored at:
//!   ~/.config/chatcal/google/app_config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use chatcal_core::{ChatCalError, ChatCalResult};

/// Google's alias for the user's main calendar.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

pub fn base_dir() -> ChatCalResult<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| ChatCalError::Config("Could not determine config directory".to_string()))?
        .join("chatcal")
        .join("google"))
}

impl AppConfig {
    pub fn load() -> ChatCalResult<Self> {
        let path = base_dir()?.join("app_config.toml");

        if !path.exists() {
            return Err(ChatCalError::Config(format!(
                "Google credentials not found.\n\n\
                Create {} with:\n\n\
                client_id = \"your-client-id.apps.googleusercontent.com\"\n\
                client_secret = \"your-client-secret\"\n\
                calendar_id = \"primary\"\n\n\
                See https://console.cloud.google.com/apis/credentials for setup.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(&path)?;

        toml::from_str(&contents).map_err(|e| {
            ChatCalError::Config(format!(
                "Failed to parse config from {}: {}",
                path.display(),
                e
            ))
        })
    }
}
