//! OAuth session storage and refresh.
//!
//! Tokens are provisioned out of band (an interactive auth flow is not
//! part of this provider) and kept in a TOML file next to the app config.
//! Expired access tokens are refreshed against Google's token endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use chatcal_core::{ChatCalError, ChatCalResult};

use crate::config::{AppConfig, base_dir};

const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct Session {
    data: SessionData,
}

impl Session {
    fn path() -> ChatCalResult<std::path::PathBuf> {
        Ok(base_dir()?.join("session.toml"))
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    /// Load the stored session, refreshing the access token if expired.
    pub async fn load_valid(http: &reqwest::Client, config: &AppConfig) -> ChatCalResult<Self> {
        let mut session = Self::load()?;

        if session.is_expired() {
            session.refresh(http, config).await?;
        }

        Ok(session)
    }

    fn load() -> ChatCalResult<Self> {
        let path = Self::path()?;

        if !path.exists() {
            return Err(ChatCalError::Config(format!(
                "Google OAuth session not found at {}. Provision tokens first.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(&path)?;

        let data: SessionData = toml::from_str(&contents).map_err(|e| {
            ChatCalError::Config(format!(
                "Failed to parse OAuth session from {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Session { data })
    }

    pub fn save(&self) -> ChatCalResult<()> {
        let contents = toml::to_string_pretty(&self.data)
            .map_err(|e| ChatCalError::Serialization(e.to_string()))?;

        let path = Self::path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, contents)?;

        // Owner-only, the file contains OAuth tokens.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.data.expires_at
    }

    async fn refresh(&mut self, http: &reqwest::Client, config: &AppConfig) -> ChatCalResult<()> {
        tracing::debug!("refreshing Google access token");

        let response = http
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("refresh_token", self.data.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Token refresh request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatCalError::Provider(format!(
                "Token refresh failed: HTTP {status}: {body}"
            )));
        }

        #[derive(Deserialize)]
        struct RefreshResponse {
            access_token: String,
            expires_in: i64,
            // Google typically doesn't return a new refresh_token on refresh
            refresh_token: Option<String>,
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to parse token response: {e}")))?;

        self.data.access_token = refreshed.access_token;
        self.data.expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);
        if let Some(refresh_token) = refreshed.refresh_token {
            self.data.refresh_token = refresh_token;
        }
        self.save()?;

        Ok(())
    }
}
