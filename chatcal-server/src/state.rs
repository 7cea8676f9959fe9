use anyhow::Result;
use std::sync::Arc;

use chatcal_core::{CalendarPort, Classifier, CommandClassifier};
use chatcal_provider_google::GoogleCalendar;

/// Shared server state: one calendar, one classifier, one timezone.
///
/// The calendar is shared across concurrent requests with no client-side
/// locking; two messages referencing the same time window can race and
/// both create an entry. Accepted limitation for a personal-calendar
/// workload.
#[derive(Clone)]
pub struct AppState {
    pub calendar: Arc<dyn CalendarPort>,
    pub classifier: Arc<dyn Classifier>,
    pub timezone: String,
}

impl AppState {
    pub fn from_env() -> Result<Self> {
        let calendar = GoogleCalendar::from_config()?;
        let classifier = std::env::var("CHATCAL_CLASSIFIER")
            .map(CommandClassifier::new)
            .unwrap_or_else(|_| CommandClassifier::default_binary());
        let timezone = std::env::var("CHATCAL_TZ").unwrap_or_else(|_| "UTC".to_string());

        Ok(AppState {
            calendar: Arc::new(calendar),
            classifier: Arc::new(classifier),
            timezone,
        })
    }
}
