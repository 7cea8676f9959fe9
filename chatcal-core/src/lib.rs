//! Core types and sync logic for the chatcal ecosystem.
//!
//! This crate provides everything that is independent of a concrete
//! calendar provider or transport:
//! - `ParsedItem` and related types for classified chat messages
//! - `CalendarPort`, the trait a calendar provider implements
//! - the reconciler, which deduplicates incoming events against the
//!   calendar's existing state
//! - the message pipeline (classify → reconcile → summary)
//! - WhatsApp chat-export ingestion

pub mod classifier;
pub mod error;
pub mod event;
pub mod ingest;
pub mod message;
pub mod pipeline;
pub mod port;
pub mod reconcile;
pub mod timezone;

pub use classifier::{Classifier, ClassifyInput, CommandClassifier};
pub use error::{ChatCalError, ChatCalResult};
pub use event::{EventPatch, EventTime, RemoteEvent};
pub use ingest::{ChatMessage, parse_whatsapp_export, parse_whatsapp_log};
pub use message::{ItemKind, ParsedEvent, ParsedItem, ParsedOther, ParsedTask};
pub use pipeline::{MessageSummary, process_message};
pub use port::CalendarPort;
pub use reconcile::{SyncAction, SyncOutcome, find_existing_event, reconcile};
