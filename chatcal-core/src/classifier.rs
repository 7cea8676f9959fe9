//! Classifier abstraction and the external-binary classifier.
//!
//! Classification (turning raw text or an image into a `ParsedItem`) is an
//! external concern: chatcal only consumes its output. The default
//! implementation talks to a classifier binary using JSON over
//! stdin/stdout, so any executable that speaks the protocol can classify —
//! including slow LLM-backed ones, hence the generous timeout.
//!
//! Protocol: one request line on stdin, one response object on stdout:
//!
//! ```json
//! {"input": {"type": "text", "value": "..."}}
//! {"status": "success", "data": {"kind": "event", ...}}
//! {"status": "error", "error": "..."}
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{ChatCalError, ChatCalResult};
use crate::message::ParsedItem;

/// Binary looked up in PATH when no explicit one is configured.
pub const DEFAULT_CLASSIFIER_BINARY: &str = "chatcal-classifier";

const CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(60);

/// Input to a classifier: a text message or a path to an image (a
/// forwarded flyer, for example).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ClassifyInput {
    Text(String),
    ImagePath(PathBuf),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, input: &ClassifyInput) -> ChatCalResult<ParsedItem>;
}

/// Request sent to the classifier binary.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub input: ClassifyInput,
}

/// Response read back from the classifier binary.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success { data: ParsedItem },
    Error { error: String },
}

/// A classifier that shells out to an external binary.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    binary: String,
}

impl CommandClassifier {
    pub fn new(binary: impl Into<String>) -> Self {
        CommandClassifier {
            binary: binary.into(),
        }
    }

    /// Use the conventional `chatcal-classifier` binary from PATH.
    pub fn default_binary() -> Self {
        Self::new(DEFAULT_CLASSIFIER_BINARY)
    }

    fn binary_path(&self) -> ChatCalResult<std::path::PathBuf> {
        which::which(&self.binary)
            .map_err(|_| ChatCalError::ClassifierNotInstalled(self.binary.clone()))
    }

    async fn call(&self, input: &ClassifyInput) -> ChatCalResult<ParsedItem> {
        let request = Request {
            input: input.clone(),
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| ChatCalError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = Command::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .spawn()
            .map_err(|e| {
                ChatCalError::Classifier(format!(
                    "Failed to spawn {}: {}",
                    binary_path.display(),
                    e
                ))
            })?;

        // Write request to stdin (unwrap safe: we piped stdin above)
        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ChatCalError::Classifier(format!(
                "Classifier exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(ChatCalError::Classifier(
                "Classifier returned no response".to_string(),
            ));
        }

        let response: Response = serde_json::from_str(response_str.trim()).map_err(|e| {
            ChatCalError::Classifier(format!("Failed to parse classifier response: {}", e))
        })?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(ChatCalError::Classifier(error)),
        }
    }
}

#[async_trait]
impl Classifier for CommandClassifier {
    async fn classify(&self, input: &ClassifyInput) -> ChatCalResult<ParsedItem> {
        timeout(CLASSIFIER_TIMEOUT, self.call(input))
            .await
            .map_err(|_| ChatCalError::ClassifierTimeout(CLASSIFIER_TIMEOUT.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ItemKind;

    #[test]
    fn test_request_wire_shape() {
        let request = Request {
            input: ClassifyInput::Text("PTA meeting tomorrow at 20:00".to_string()),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"input":{"type":"text","value":"PTA meeting tomorrow at 20:00"}}"#
        );
    }

    #[test]
    fn test_success_response_carries_parsed_item() {
        let json = r#"{"status":"success","data":{"kind":"event","name":"PTA meeting","date":"2025-09-10T20:00:00"}}"#;
        let response: Response = serde_json::from_str(json).unwrap();
        match response {
            Response::Success { data } => assert_eq!(data.kind(), ItemKind::Event),
            Response::Error { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn test_error_response() {
        let json = r#"{"status":"error","error":"model unavailable"}"#;
        let response: Response = serde_json::from_str(json).unwrap();
        assert!(matches!(response, Response::Error { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_installed() {
        let classifier = CommandClassifier::new("chatcal-classifier-that-does-not-exist");
        let err = classifier
            .classify(&ClassifyInput::Text("hi".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatCalError::ClassifierNotInstalled(_)));
    }
}
