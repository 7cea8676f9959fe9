//! Google Calendar provider for chatcal.
//!
//! Implements `chatcal_core::CalendarPort` against the Calendar v3 REST
//! API, scoped to one calendar id. OAuth tokens are provisioned out of
//! band and stored at:
//!
//! ```text
//! ~/.config/chatcal/google/app_config.toml   (client credentials + calendar id)
//! ~/.config/chatcal/google/session.toml      (access/refresh tokens)
//! ```

mod api;
mod config;
mod session;

pub use api::GoogleCalendar;
pub use config::AppConfig;
pub use session::{Session, SessionData};
