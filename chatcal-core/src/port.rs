//! The calendar port: uniform access to one remote calendar.
//!
//! A provider implements this trait for a single calendar identified by an
//! opaque id. Keeping the reconciler behind this seam means it can be
//! tested against an in-memory fake and stays decoupled from any given
//! provider transport.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::ChatCalResult;
use crate::event::{EventPatch, RemoteEvent};
use crate::message::ParsedEvent;

#[async_trait]
pub trait CalendarPort: Send + Sync {
    /// Create a remote event from a parsed event, with `start = event.date`
    /// (localized to `timezone` when naive) and `end = start +
    /// duration_minutes`. Returns the provider-assigned id.
    async fn create_event(
        &self,
        event: &ParsedEvent,
        duration_minutes: i64,
        timezone: &str,
    ) -> ChatCalResult<String>;

    /// Apply a partial update to an existing event. Only fields set in the
    /// patch are overwritten; everything else keeps its remote value.
    ///
    /// Fails with `NotFound` if `event_id` no longer exists.
    async fn update_event(
        &self,
        event_id: &str,
        patch: EventPatch,
        timezone: &str,
    ) -> ChatCalResult<RemoteEvent>;

    /// Delete an event. Already-deleted events count as success.
    async fn delete_event(&self, event_id: &str) -> ChatCalResult<()>;

    /// List events whose start falls in `[from, to]`, filtered by the
    /// provider's free-text search on `query`, ordered by start time
    /// ascending. The text filter is best-effort and provider-defined;
    /// callers re-check candidates themselves.
    async fn search_events(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        query: &str,
    ) -> ChatCalResult<Vec<RemoteEvent>>;
}
