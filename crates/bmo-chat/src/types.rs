//! Domain types for sessions, turns, and structured model responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a session's history. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Robot behaviour requested by the model.
///
/// Values outside the known set are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    Navigating,
    Speaking,
    Other(String),
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Navigating => "NAVIGATING",
            Mode::Speaking => "SPEAKING",
            Mode::Other(raw) => raw,
        }
    }
}

impl From<String> for Mode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "NAVIGATING" => Mode::Navigating,
            "SPEAKING" => Mode::Speaking,
            _ => Mode::Other(raw),
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized output of one successful chat call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub narration: String,
    pub destination: String,
    pub directions: Vec<String>,
    pub mode: Mode,
}

/// Synthesized speech for a narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechPayload {
    pub mime_type: String,
    /// Base64-encoded audio bytes.
    pub base64: String,
}

/// Result of starting a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStart {
    pub session_id: Uuid,
    /// The greeting recorded as the first assistant turn.
    pub message: String,
}

/// Everything produced by one conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub session_id: Uuid,
    pub transcript: String,
    pub narration: String,
    pub destination: String,
    pub directions: Vec<String>,
    pub mode: Mode,
    pub speech: SpeechPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = Turn::assistant("hi");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_mode_known_values() {
        assert_eq!(Mode::from("NAVIGATING".to_string()), Mode::Navigating);
        assert_eq!(Mode::from("SPEAKING".to_string()), Mode::Speaking);
        assert_eq!(Mode::Navigating.to_string(), "NAVIGATING");
    }

    #[test]
    fn test_mode_passes_through_unknown_values() {
        let mode = Mode::from("DANCING".to_string());
        assert_eq!(mode, Mode::Other("DANCING".to_string()));
        assert_eq!(serde_json::to_value(&mode).unwrap(), "DANCING");

        // Case is not normalized.
        let mode: Mode = serde_json::from_str("\"speaking\"").unwrap();
        assert_eq!(mode, Mode::Other("speaking".to_string()));
    }

    #[test]
    fn test_turn_result_json_shape() {
        let result = TurnResult {
            session_id: Uuid::nil(),
            transcript: "where is the library".to_string(),
            narration: "Follow me.".to_string(),
            destination: "Library".to_string(),
            directions: vec!["Turn left".to_string()],
            mode: Mode::Navigating,
            speech: SpeechPayload {
                mime_type: "audio/mpeg".to_string(),
                base64: "AAAA".to_string(),
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mode"], "NAVIGATING");
        assert_eq!(json["speech"]["mime_type"], "audio/mpeg");
        assert_eq!(json["directions"][0], "Turn left");
    }
}
