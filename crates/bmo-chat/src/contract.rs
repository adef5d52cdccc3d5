//! Response contract: decode the model's JSON, then apply field defaults.
//!
//! Decoding and defaulting are separate steps. A payload that does not
//! decode is an upstream contract violation; a payload that decodes but
//! lacks fields is completed with defaults.

use serde::Deserialize;

use crate::error::ChatError;
use crate::types::{Mode, TurnResponse};

/// Narration used when the model leaves it empty.
pub const FALLBACK_NARRATION: &str = "Let me find that for you.";
/// Destination used when the model leaves it empty.
pub const DEFAULT_DESTINATION: &str = "General";

/// The model's payload as decoded, before defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTurnResponse {
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub directions: Option<Vec<String>>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl RawTurnResponse {
    /// Decode a raw completion. Never repairs malformed input.
    pub fn decode(raw: &str) -> Result<Self, ChatError> {
        serde_json::from_str(raw).map_err(|e| ChatError::UpstreamContract(e.to_string()))
    }

    /// Fill each absent or empty field with its default.
    pub fn normalize(self) -> TurnResponse {
        TurnResponse {
            narration: non_empty(self.narration).unwrap_or_else(|| FALLBACK_NARRATION.to_string()),
            destination: non_empty(self.destination)
                .unwrap_or_else(|| DEFAULT_DESTINATION.to_string()),
            directions: self.directions.unwrap_or_default(),
            mode: non_empty(self.mode).map(Mode::from).unwrap_or(Mode::Speaking),
        }
    }
}

/// Decode and normalize in one step.
pub fn parse_turn_response(raw: &str) -> Result<TurnResponse, ChatError> {
    RawTurnResponse::decode(raw).map(RawTurnResponse::normalize)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_payload_is_kept() {
        let raw = r#"{
            "narration": "The library is past the fountain.",
            "destination": "Library",
            "directions": ["Exit the hall", "Turn right at the fountain"],
            "mode": "NAVIGATING"
        }"#;
        let response = parse_turn_response(raw).unwrap();
        assert_eq!(response.narration, "The library is past the fountain.");
        assert_eq!(response.destination, "Library");
        assert_eq!(response.directions.len(), 2);
        assert_eq!(response.mode, Mode::Navigating);
    }

    #[test]
    fn test_missing_destination_defaults_to_general() {
        let raw = r#"{"narration":"Hi!","directions":["Wave"],"mode":"SPEAKING"}"#;
        let response = parse_turn_response(raw).unwrap();
        assert_eq!(response.destination, "General");
        assert_eq!(response.narration, "Hi!");
        assert_eq!(response.directions, vec!["Wave"]);
        assert_eq!(response.mode, Mode::Speaking);
    }

    #[test]
    fn test_empty_object_gets_all_defaults() {
        let response = parse_turn_response("{}").unwrap();
        assert_eq!(response.narration, FALLBACK_NARRATION);
        assert_eq!(response.destination, DEFAULT_DESTINATION);
        assert!(response.directions.is_empty());
        assert_eq!(response.mode, Mode::Speaking);
    }

    #[test]
    fn test_empty_and_null_fields_get_defaults() {
        let raw = r#"{"narration":"","destination":null,"directions":null,"mode":""}"#;
        let response = parse_turn_response(raw).unwrap();
        assert_eq!(response.narration, FALLBACK_NARRATION);
        assert_eq!(response.destination, DEFAULT_DESTINATION);
        assert!(response.directions.is_empty());
        assert_eq!(response.mode, Mode::Speaking);
    }

    #[test]
    fn test_whitespace_only_fields_pass_through() {
        let raw = r#"{"narration":" ","destination":"  ","mode":" "}"#;
        let response = parse_turn_response(raw).unwrap();
        assert_eq!(response.narration, " ");
        assert_eq!(response.destination, "  ");
        assert_eq!(response.mode, Mode::Other(" ".to_string()));
    }

    #[test]
    fn test_unknown_mode_passes_through() {
        let response = parse_turn_response(r#"{"narration":"ok","mode":"IDLE"}"#).unwrap();
        assert_eq!(response.mode, Mode::Other("IDLE".to_string()));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let response = parse_turn_response(r#"{"narration":"ok","confidence":0.9}"#).unwrap();
        assert_eq!(response.narration, "ok");
    }

    #[test]
    fn test_malformed_json_is_a_contract_error() {
        for raw in [
            "Sure! The library is that way.",
            "```json\n{\"narration\":\"hi\"}\n```",
            "{\"narration\": \"cut off",
            "",
        ] {
            let err = parse_turn_response(raw).unwrap_err();
            assert!(matches!(err, ChatError::UpstreamContract(_)), "input {raw:?}");
        }
    }

    #[test]
    fn test_wrong_shape_is_a_contract_error() {
        assert!(matches!(
            parse_turn_response(r#"["narration"]"#),
            Err(ChatError::UpstreamContract(_))
        ));
        assert!(matches!(
            parse_turn_response(r#"{"directions":"turn left"}"#),
            Err(ChatError::UpstreamContract(_))
        ));
    }

    #[test]
    fn test_decode_keeps_absence_distinct_from_defaults() {
        let raw = RawTurnResponse::decode(r#"{"narration":"hello"}"#).unwrap();
        assert_eq!(raw.narration.as_deref(), Some("hello"));
        assert!(raw.destination.is_none());
        assert!(raw.directions.is_none());
        assert!(raw.mode.is_none());
    }
}
