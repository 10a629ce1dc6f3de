use serde::{ Deserialize, Serialize };
use serde_json::Value;

use super::chat::{ HistoryEntry, Role };

pub const MESSAGE_REQUIRED: &str = "Message is required.";
pub const ARCHIVE_FAILED: &str = "The archive failed to respond.";

/// Body of `POST /api/message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl RelayRequest {
    /// Reads a request body without rejecting odd shapes.
    ///
    /// `message` is stringified (see [`coerce_to_string`]) and trimmed. `history` that is missing or not an array becomes empty, and
    /// entries with an unknown role or a non-string text are dropped.
    pub fn from_json(body: &Value) -> Self {
        let message = body.get("message").map(coerce_to_string).unwrap_or_default();
        let history = body
            .get("history")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(history_entry).collect())
            .unwrap_or_default();

        Self { message: message.trim().to_string(), history }
    }
}

fn history_entry(value: &Value) -> Option<HistoryEntry> {
    let role = value.get("role").and_then(Value::as_str).and_then(Role::parse)?;
    let text = value.get("text").and_then(Value::as_str)?;
    Some(HistoryEntry { role, text: text.to_string() })
}

/// Stringifies a JSON value the way a browser's `String(value)` would.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| if item.is_null() { String::new() } else { coerce_to_string(item) })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBody {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// What the client reads back: either field may be absent or mistyped.
#[derive(Debug, Default, Deserialize)]
pub struct RelayResponseBody {
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RelayResponseBody {
    pub fn reply_text(&self) -> String {
        self.text.as_ref().map(coerce_to_string).unwrap_or_default()
    }

    /// Non-empty `error` string, if the server supplied one.
    pub fn error_message(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(coerce_to_string)
            .filter(|e| !e.is_empty())
    }
}
