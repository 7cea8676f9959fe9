//! Provider-neutral calendar event types.
//!
//! The remote calendar owns these resources; chatcal only reads them for
//! duplicate matching and writes them through `CalendarPort`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Start or end time of a remote event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    /// All-day event.
    Date(NaiveDate),
    /// Timed event, with whatever offset the provider reported.
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::DateTime(dt) => Some(dt.with_timezone(&Utc)),
            EventTime::Date(_) => None,
        }
    }
}

/// A calendar event as it exists on the provider.
///
/// `id` is opaque and provider-assigned. The provider owns the full
/// lifecycle; this is only the slice chatcal needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
}

/// A partial update for a remote event.
///
/// Only the fields that are `Some` are written; everything else on the
/// remote resource is left untouched (merge-patch semantics). Naive
/// timestamps are localized against the caller-supplied timezone at the
/// provider boundary.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}
