use chrono::{ DateTime, Local, Utc };
use serde::{ Deserialize, Serialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    /// Accepts only the two speaker tags the relay understands.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "model" => Some(Role::Model),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message shown in the conversation. Never sent as-is; see [`HistoryEntry`].
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into(), timestamp: Utc::now() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into(), timestamp: Utc::now() }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Hour and minute in the viewer's local time, e.g. `09:41`.
    pub fn format_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }

    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry { role: self.role, text: self.text.clone() }
    }
}

/// A turn as it travels to the relay: timestamp stripped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

/// The last `window` turns in their original order.
pub fn recent_history(turns: &[Turn], window: usize) -> Vec<HistoryEntry> {
    let start = turns.len().saturating_sub(window);
    turns[start..].iter().map(Turn::to_history_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| if i % 2 == 0 { Turn::user(format!("q{}", i)) } else { Turn::model(format!("a{}", i)) })
            .collect()
    }

    #[test]
    fn recent_history_keeps_last_window_in_order() {
        let turns = conversation(20);
        let history = recent_history(&turns, 12);

        assert_eq!(history.len(), 12);
        assert_eq!(history.first().map(|h| h.text.as_str()), Some("q8"));
        assert_eq!(history.last().map(|h| h.text.as_str()), Some("a19"));
        for (entry, turn) in history.iter().zip(&turns[8..]) {
            assert_eq!(entry.role, turn.role);
            assert_eq!(entry.text, turn.text);
        }
    }

    #[test]
    fn recent_history_shorter_than_window_is_whole_conversation() {
        let turns = conversation(3);
        assert_eq!(recent_history(&turns, 12).len(), 3);
        assert!(recent_history(&[], 12).is_empty());
    }

    #[test]
    fn history_entry_serializes_without_timestamp() {
        let entry = Turn::user("hi").to_history_entry();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "text": "hi" }));
    }

    #[test]
    fn request_history_built_from_turns_has_only_role_and_text() {
        let turns = conversation(2);
        let json = serde_json::to_value(recent_history(&turns, 12)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "role": "user", "text": "q0" },
                { "role": "model", "text": "a1" }
            ])
        );
    }

    #[test]
    fn role_parse_rejects_unknown_tags() {
        assert_eq!(Role::parse("model"), Some(Role::Model));
        assert_eq!(Role::parse("assistant"), None);
        assert_eq!(Role::parse("User"), None);
    }
}
