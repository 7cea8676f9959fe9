//! Classified message types.
//!
//! A classifier turns one inbound chat message into a `ParsedItem`:
//! an event to put on the calendar, a task, or something else entirely.
//! These are ephemeral, produced per message and consumed once by the
//! reconciler.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ChatCalError, ChatCalResult};

/// The typed result of classifying one inbound message.
///
/// `date` fields are naive wall-clock timestamps: the classifier carries no
/// timezone, so dates are interpreted against a caller-supplied IANA zone
/// only at the calendar boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParsedItem {
    Event(ParsedEvent),
    Task(ParsedTask),
    Other(ParsedOther),
}

/// A calendar-worthy event recognized in a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEvent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message: Option<String>,
}

/// An action item recognized in a message (not synced to the calendar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message: Option<String>,
}

/// A message that is neither an event nor a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedOther {
    pub original_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Discriminant of a `ParsedItem`, used in result summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Event,
    Task,
    Other,
}

impl ParsedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            ParsedItem::Event(_) => ItemKind::Event,
            ParsedItem::Task(_) => ItemKind::Task,
            ParsedItem::Other(_) => ItemKind::Other,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ParsedItem::Event(e) => Some(&e.name),
            ParsedItem::Task(t) => Some(&t.name),
            ParsedItem::Other(_) => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        match self {
            ParsedItem::Event(e) => e.date,
            ParsedItem::Task(t) => t.date,
            ParsedItem::Other(_) => None,
        }
    }
}

impl ParsedEvent {
    /// Check the invariants required before sync: a non-empty name and a
    /// date. The matching window is centered on the date, so reconciliation
    /// cannot proceed without one.
    pub fn validated(&self) -> ChatCalResult<NaiveDateTime> {
        if self.name.trim().is_empty() {
            return Err(ChatCalError::Validation("event has no name".to_string()));
        }
        self.date.ok_or_else(|| {
            ChatCalError::Validation(format!("event '{}' has no date", self.name))
        })
    }
}
