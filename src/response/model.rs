use std::path::PathBuf;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Json,
    Text,
    Attachment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub saved_to: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Attachment(Attachment),
}

impl Payload {
    pub fn classification(&self) -> Classification {
        match self {
            Payload::Json(_) => Classification::Json,
            Payload::Text(_) => Classification::Text,
            Payload::Attachment(_) => Classification::Attachment,
        }
    }

    /// Human-readable rendering used for error bodies and terminal output.
    pub fn render(&self) -> String {
        match self {
            Payload::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Payload::Text(text) => text.clone(),
            Payload::Attachment(attachment) => format!(
                "<attachment {} ({} bytes)>",
                attachment.filename,
                attachment.bytes.len()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedResponse {
    pub payload: Payload,
    pub correlation_id: String,
    pub elapsed_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Success {
        status: u16,
        payload: Payload,
        correlation_id: String,
        elapsed_seconds: Option<f64>,
    },
    Failure {
        message: String,
        status_text: Option<String>,
        raw_body: Option<String>,
        correlation_id: String,
        elapsed_seconds: Option<f64>,
    },
}

impl ResponseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseOutcome::Success { .. })
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            ResponseOutcome::Success { correlation_id, .. }
            | ResponseOutcome::Failure { correlation_id, .. } => correlation_id,
        }
    }

    pub fn elapsed_seconds(&self) -> Option<f64> {
        match self {
            ResponseOutcome::Success {
                elapsed_seconds, ..
            }
            | ResponseOutcome::Failure {
                elapsed_seconds, ..
            } => *elapsed_seconds,
        }
    }
}
