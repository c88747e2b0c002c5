//! Error types for the portal protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned with non-2xx responses.
///
/// The backend reports failures as `{"detail": ...}`, where `detail` is
/// either a string or a list of field errors. Some handlers answer with
/// `{"status": "...", "message": "..."}` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Body carrying a single detail string.
    pub fn detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
            message: None,
        }
    }

    /// Best human-readable message in the body, if any.
    pub fn user_message(&self) -> Option<String> {
        match &self.detail {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Array(items)) => {
                if let Some(msg) = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .next()
                {
                    return Some(msg.to_string());
                }
            }
            _ => {}
        }
        self.message.clone().filter(|m| !m.trim().is_empty())
    }

    /// Parse an error body from raw response text.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Protocol-level parse errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),

    #[error("Unknown attribute type '{0}'; expected bool, int or str")]
    UnknownAttrType(String),

    #[error("Value '{value}' is not valid for type '{attr_type}'")]
    InvalidValue { attr_type: &'static str, value: String },
}
