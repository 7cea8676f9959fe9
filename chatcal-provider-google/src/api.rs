//! Calendar v3 REST client implementing `CalendarPort`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use chatcal_core::timezone;
use chatcal_core::{
    CalendarPort, ChatCalError, ChatCalResult, EventPatch, EventTime, ParsedEvent, RemoteEvent,
};

use crate::config::AppConfig;
use crate::session::Session;

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar scoped to one calendar id.
pub struct GoogleCalendar {
    http: reqwest::Client,
    config: AppConfig,
}

/// Google's event start/end shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

/// The slice of Google's event resource that chatcal reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start: Option<GoogleEventTime>,
    #[serde(default)]
    end: Option<GoogleEventTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertEventBody {
    summary: String,
    description: String,
    location: String,
    start: GoogleEventTime,
    end: GoogleEventTime,
}

#[derive(Debug, Deserialize)]
struct ListEventsResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

/// Attach a timezone to a naive wall-clock timestamp, Google style: an
/// offset-qualified dateTime plus the resolved IANA zone name. An unknown
/// zone identifier falls back to UTC (wall-clock numbers preserved), so an
/// invalid identifier never reaches the API.
fn zoned(naive: NaiveDateTime, tz: &str) -> GoogleEventTime {
    let localized = timezone::localize(naive, tz);
    GoogleEventTime {
        date_time: Some(localized.fixed_offset()),
        date: None,
        time_zone: Some(timezone::resolve(tz).name().to_string()),
    }
}

/// Apply a partial update onto the raw event resource fetched from Google.
/// Mutating the fetched JSON in place (rather than building a fresh body)
/// preserves every field the patch doesn't mention — attendees, reminders,
/// colors — across the write-back.
fn apply_patch(
    current: &mut serde_json::Value,
    patch: &EventPatch,
    tz: &str,
) -> ChatCalResult<()> {
    let to_value = |time: &GoogleEventTime| {
        serde_json::to_value(time).map_err(|e| ChatCalError::Serialization(e.to_string()))
    };

    if let Some(ref summary) = patch.summary {
        current["summary"] = serde_json::Value::String(summary.clone());
    }
    if let Some(ref description) = patch.description {
        current["description"] = serde_json::Value::String(description.clone());
    }
    if let Some(ref location) = patch.location {
        current["location"] = serde_json::Value::String(location.clone());
    }
    if let Some(start) = patch.start {
        current["start"] = to_value(&zoned(start, tz))?;
    }
    if let Some(end) = patch.end {
        current["end"] = to_value(&zoned(end, tz))?;
    }

    Ok(())
}

impl From<GoogleEvent> for RemoteEvent {
    fn from(event: GoogleEvent) -> Self {
        let convert = |time: GoogleEventTime| {
            if let Some(dt) = time.date_time {
                Some(EventTime::DateTime(dt))
            } else {
                time.date.map(EventTime::Date)
            }
        };

        RemoteEvent {
            id: event.id,
            summary: event.summary,
            description: event.description,
            location: event.location,
            start: event.start.and_then(convert),
            end: event.end.and_then(convert),
        }
    }
}

/// Window bounds carry no zone of their own; they are labeled UTC on the
/// wire. The ±2h search window is coarse enough that this never decides a
/// match by itself.
fn window_bound(naive: NaiveDateTime) -> String {
    format!("{}Z", naive.format("%Y-%m-%dT%H:%M:%S"))
}

impl GoogleCalendar {
    pub fn new(config: AppConfig) -> Self {
        GoogleCalendar {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Build a client from the config file under the platform config dir.
    pub fn from_config() -> ChatCalResult<Self> {
        Ok(Self::new(AppConfig::load()?))
    }

    fn events_url(&self) -> String {
        format!("{CALENDAR_API}/calendars/{}/events", self.config.calendar_id)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), event_id)
    }

    async fn token(&self) -> ChatCalResult<String> {
        let session = Session::load_valid(&self.http, &self.config).await?;
        Ok(session.access_token().to_string())
    }

    /// Map a response to a provider/not-found error unless it succeeded.
    async fn checked(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> ChatCalResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ChatCalError::NotFound(format!("{context}: {body}")));
        }
        Err(ChatCalError::Provider(format!(
            "{context}: HTTP {status}: {body}"
        )))
    }

    async fn fetch_raw_event(&self, event_id: &str) -> ChatCalResult<serde_json::Value> {
        let token = self.token().await?;
        let response = self
            .http
            .get(self.event_url(event_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to fetch event: {e}")))?;

        let response = self
            .checked(response, &format!("Fetching event {event_id}"))
            .await?;

        response
            .json()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to parse event: {e}")))
    }
}

#[async_trait]
impl CalendarPort for GoogleCalendar {
    async fn create_event(
        &self,
        event: &ParsedEvent,
        duration_minutes: i64,
        timezone_id: &str,
    ) -> ChatCalResult<String> {
        let start = event.validated()?;
        let end = start + Duration::minutes(duration_minutes);

        let body = InsertEventBody {
            summary: event.name.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start: zoned(start, timezone_id),
            end: zoned(end, timezone_id),
        };

        tracing::info!(name = %event.name, date = %start, tz = timezone_id, "creating calendar event");

        let token = self.token().await?;
        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to create event: {e}")))?;

        let response = self
            .checked(response, &format!("Creating event '{}'", event.name))
            .await?;

        let created: GoogleEvent = response
            .json()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to parse created event: {e}")))?;

        Ok(created.id)
    }

    async fn update_event(
        &self,
        event_id: &str,
        patch: EventPatch,
        timezone_id: &str,
    ) -> ChatCalResult<RemoteEvent> {
        // Read-modify-write: fetch the full resource, overwrite only the
        // patched fields, put it back.
        let mut current = self.fetch_raw_event(event_id).await?;
        apply_patch(&mut current, &patch, timezone_id)?;

        tracing::info!(event_id, "updating calendar event");

        let token = self.token().await?;
        let response = self
            .http
            .put(self.event_url(event_id))
            .bearer_auth(&token)
            .json(&current)
            .send()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to update event: {e}")))?;

        let response = self
            .checked(response, &format!("Updating event {event_id}"))
            .await?;

        let updated: GoogleEvent = response
            .json()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to parse updated event: {e}")))?;

        Ok(updated.into())
    }

    async fn delete_event(&self, event_id: &str) -> ChatCalResult<()> {
        tracing::info!(event_id, "deleting calendar event");

        let token = self.token().await?;
        let response = self
            .http
            .delete(self.event_url(event_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to delete event: {e}")))?;

        // Google answers 410 Gone for an already-deleted event.
        if response.status() == reqwest::StatusCode::GONE {
            tracing::debug!(event_id, "event already deleted");
            return Ok(());
        }

        self.checked(response, &format!("Deleting event {event_id}"))
            .await?;
        Ok(())
    }

    async fn search_events(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        query: &str,
    ) -> ChatCalResult<Vec<RemoteEvent>> {
        let time_min = window_bound(from);
        let time_max = window_bound(to);

        let token = self.token().await?;
        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(&token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("showDeleted", "false"),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to list events: {e}")))?;

        let response = self.checked(response, "Listing events").await?;

        let list: ListEventsResponse = response
            .json()
            .await
            .map_err(|e| ChatCalError::Provider(format!("Failed to parse event list: {e}")))?;

        Ok(list
            .items
            .into_iter()
            .filter(|e| e.status.as_deref() != Some("cancelled") && !e.id.is_empty())
            .map(RemoteEvent::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn sep_10_at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_zoned_localizes_wall_clock() {
        let time = zoned(sep_10_at(20, 0), "Asia/Jerusalem");
        assert_eq!(
            time.date_time.unwrap().to_rfc3339(),
            "2025-09-10T20:00:00+03:00"
        );
        assert_eq!(time.time_zone.as_deref(), Some("Asia/Jerusalem"));
    }

    #[test]
    fn test_zoned_invalid_zone_falls_back_to_utc() {
        let time = zoned(sep_10_at(20, 0), "Not/AZone");
        assert_eq!(
            time.date_time.unwrap().to_rfc3339(),
            "2025-09-10T20:00:00+00:00"
        );
        assert_eq!(time.time_zone.as_deref(), Some("UTC"));
    }

    #[test]
    fn test_apply_patch_preserves_unrelated_fields() {
        let mut current = json!({
            "id": "abc",
            "summary": "PTA meeting - reminder",
            "colorId": "5",
            "attendees": [{"email": "dana@example.com"}],
            "start": {"dateTime": "2025-09-10T20:05:00+03:00", "timeZone": "Asia/Jerusalem"},
            "end": {"dateTime": "2025-09-10T21:05:00+03:00", "timeZone": "Asia/Jerusalem"},
        });

        let patch = EventPatch {
            summary: Some("PTA meeting".to_string()),
            description: Some("Agenda in the group".to_string()),
            location: None,
            start: Some(sep_10_at(20, 0)),
            end: Some(sep_10_at(21, 0)),
        };

        apply_patch(&mut current, &patch, "Asia/Jerusalem").unwrap();

        assert_eq!(current["summary"], "PTA meeting");
        assert_eq!(current["description"], "Agenda in the group");
        // Unpatched fields keep their prior values.
        assert_eq!(current["colorId"], "5");
        assert_eq!(current["attendees"][0]["email"], "dana@example.com");
        assert!(current.get("location").is_none());
        assert_eq!(current["start"]["dateTime"], "2025-09-10T20:00:00+03:00");
        assert_eq!(current["end"]["dateTime"], "2025-09-10T21:00:00+03:00");
    }

    #[test]
    fn test_window_bound_is_utc_labeled() {
        assert_eq!(window_bound(sep_10_at(18, 0)), "2025-09-10T18:00:00Z");
    }

    #[test]
    fn test_google_event_conversion() {
        let event: GoogleEvent = serde_json::from_value(json!({
            "id": "abc",
            "summary": "PTA meeting",
            "location": "School Hall",
            "start": {"dateTime": "2025-09-10T20:00:00+03:00"},
            "end": {"date": "2025-09-11"},
        }))
        .unwrap();

        let remote: RemoteEvent = event.into();
        assert_eq!(remote.id, "abc");
        assert_eq!(remote.summary, "PTA meeting");
        assert_eq!(remote.description, None);
        match remote.start {
            Some(EventTime::DateTime(dt)) => {
                assert_eq!(dt.to_rfc3339(), "2025-09-10T20:00:00+03:00")
            }
            other => panic!("expected a timed start, got {other:?}"),
        }
        assert!(matches!(remote.end, Some(EventTime::Date(_))));
    }
}
