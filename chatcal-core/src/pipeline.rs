//! Single-message pipeline: classify → reconcile → summary.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, ClassifyInput};
use crate::error::ChatCalResult;
use crate::message::{ItemKind, ParsedItem};
use crate::port::CalendarPort;
use crate::reconcile::{SyncAction, reconcile};

/// What happened to one inbound message.
///
/// `action` and `event_id` are present together or not at all: a failed
/// reconciliation surfaces as an error, never as a half-filled summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<SyncAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Process one inbound text message: classify it, sync it into the
/// calendar when it is an event, and report what was found and done.
pub async fn process_message(
    text: &str,
    classifier: &dyn Classifier,
    port: &dyn CalendarPort,
    timezone: &str,
) -> ChatCalResult<MessageSummary> {
    let parsed = classifier
        .classify(&ClassifyInput::Text(text.to_string()))
        .await?;

    tracing::debug!(kind = ?parsed.kind(), name = parsed.name(), "classified message");

    let mut summary = MessageSummary {
        kind: parsed.kind(),
        name: parsed.name().map(str::to_string),
        date: parsed.date(),
        action: None,
        event_id: None,
    };

    if let ParsedItem::Event(event) = &parsed {
        let outcome = reconcile(event, port, timezone).await?;
        summary.action = Some(outcome.action);
        summary.event_id = Some(outcome.event_id);
    }

    Ok(summary)
}
