//! WhatsApp chat-export ingestion.
//!
//! WhatsApp exports a chat as a plain text file where each message starts
//! with a single header line:
//!
//! ```text
//! 8/31/25, 17:13 - Name: Message text
//! ```
//!
//! System messages ("Name changed the group description") carry no author.
//! Messages spanning multiple lines continue on following lines without a
//! header and are folded back into the previous message.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::ChatCalResult;

static MESSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}/\d{1,2}/\d{2,4}), (\d{1,2}:\d{2}) - (.*?): (.*)$").unwrap()
});

static SYSTEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}/\d{1,2}/\d{2,4}), (\d{1,2}:\d{2}) - (.*)$").unwrap());

/// One message from a chat export.
///
/// Date and time are kept verbatim: export formats vary by locale (2- vs
/// 4-digit years, day/month order) and the classifier reads the message
/// text anyway.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub date: Option<String>,
    pub time: Option<String>,
    pub author: Option<String>,
    pub text: String,
}

/// Parse a WhatsApp-exported chat file into a list of messages.
pub fn parse_whatsapp_export(path: &Path) -> ChatCalResult<Vec<ChatMessage>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_whatsapp_log(&content))
}

/// Parse WhatsApp export content into a list of messages.
pub fn parse_whatsapp_log(content: &str) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = Vec::new();
    let mut current: Option<ChatMessage> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = MESSAGE_RE.captures(line) {
            if let Some(done) = current.take() {
                messages.push(done);
            }
            current = Some(ChatMessage {
                date: Some(caps[1].to_string()),
                time: Some(caps[2].to_string()),
                author: Some(caps[3].to_string()),
                text: caps[4].trim().to_string(),
            });
        } else if let Some(caps) = SYSTEM_RE.captures(line) {
            if let Some(done) = current.take() {
                messages.push(done);
            }
            current = Some(ChatMessage {
                date: Some(caps[1].to_string()),
                time: Some(caps[2].to_string()),
                author: None,
                text: caps[3].trim().to_string(),
            });
        } else {
            match current.as_mut() {
                Some(message) => {
                    message.text.push('\n');
                    message.text.push_str(line);
                }
                // A file starting mid-message; keep the text anyway.
                None => {
                    current = Some(ChatMessage {
                        date: None,
                        time: None,
                        author: None,
                        text: line.to_string(),
                    });
                }
            }
        }
    }

    if let Some(done) = current {
        messages.push(done);
    }

    messages
}
