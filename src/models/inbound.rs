//! Inbound side of the Cloud API webhook envelope
//! (`entry[0].changes[0].value.{messages,contacts}`).
//!
//! Fields are looked up one by one on the raw JSON so that an odd shape in
//! one place (a null `contacts`, a numeric body, a malformed sibling entry)
//! only costs that field its default.

use serde_json::Value;

use crate::errors::InboundError;

const DEFAULT_SENDER_NAME: &str = "there";
const NO_TEXT: &str = "(no text)";

/// One inbound text message, reduced to what the auto-reply needs.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub from: String,
    pub text: String,
    pub sender_name: String,
}

impl InboundEvent {
    /// Parse a raw webhook body and pull out the first message of the first
    /// change.
    pub fn parse(raw: &[u8]) -> Result<Self, InboundError> {
        let envelope: Value =
            serde_json::from_slice(raw).map_err(|e| InboundError::Unparseable(e.to_string()))?;

        let value = envelope
            .pointer("/entry/0/changes/0/value")
            .filter(|value| !is_blank(value))
            .ok_or(InboundError::MissingValue)?;

        Self::extract(value)
    }

    pub fn extract(value: &Value) -> Result<Self, InboundError> {
        let message = value.pointer("/messages/0");

        let from = message
            .and_then(|m| m.get("from"))
            .and_then(scalar_text)
            .filter(|from| !is_blank_text(from))
            .ok_or(InboundError::MissingFrom)?;

        let text = message
            .and_then(|m| m.pointer("/text/body"))
            .and_then(scalar_text)
            .unwrap_or_default();

        let sender_name = value
            .pointer("/contacts/0/profile/name")
            .and_then(scalar_text)
            .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string());

        Ok(Self {
            from,
            text,
            sender_name,
        })
    }

    pub fn reply_text(&self) -> String {
        let said = if is_blank_text(&self.text) {
            NO_TEXT
        } else {
            self.text.as_str()
        };
        format!("Hi {} 👋 You said: {}", self.sender_name, said)
    }
}

/// Strings and numbers read as text; anything else counts as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank_text(s: &str) -> bool {
    s.is_empty() || s == "0"
}

/// Values that count as "nothing there": null, false, zero, and empty
/// strings, arrays or objects.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => is_blank_text(s),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_envelope() {
        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"15551234567","text":{"body":"hi"}}],"contacts":[{"profile":{"name":"Ann"}}]}}]}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.from, "15551234567");
        assert_eq!(event.text, "hi");
        assert_eq!(event.sender_name, "Ann");
        assert_eq!(event.reply_text(), "Hi Ann 👋 You said: hi");
    }

    #[test]
    fn test_parse_defaults_name_and_text() {
        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"15551234567","type":"image"}]}}]}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.text, "");
        assert_eq!(event.sender_name, "there");
        assert_eq!(event.reply_text(), "Hi there 👋 You said: (no text)");
    }

    #[test]
    fn test_parse_empty_object_has_no_value() {
        assert_eq!(InboundEvent::parse(b"{}"), Err(InboundError::MissingValue));
    }

    #[test]
    fn test_parse_empty_value_has_no_value() {
        let raw = br#"{"entry":[{"changes":[{"value":{}}]}]}"#;
        assert_eq!(InboundEvent::parse(raw), Err(InboundError::MissingValue));
    }

    #[test]
    fn test_parse_garbage_is_unparseable() {
        assert!(matches!(
            InboundEvent::parse(b"not json"),
            Err(InboundError::Unparseable(_))
        ));
    }

    #[test]
    fn test_status_update_has_no_from() {
        let raw = br#"{"entry":[{"changes":[{"value":{"statuses":[{"id":"wamid.1","status":"delivered"}]}}]}]}"#;
        assert_eq!(InboundEvent::parse(raw), Err(InboundError::MissingFrom));
    }

    #[test]
    fn test_empty_from_counts_as_missing() {
        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"","text":{"body":"hi"}}]}}]}]}"#;
        assert_eq!(InboundEvent::parse(raw), Err(InboundError::MissingFrom));
    }

    #[test]
    fn test_null_contacts_fall_back_to_default_name() {
        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"1555","text":{"body":"hi"}}],"contacts":null}}]}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.from, "1555");
        assert_eq!(event.sender_name, "there");
        assert_eq!(event.reply_text(), "Hi there 👋 You said: hi");
    }

    #[test]
    fn test_numeric_body_is_read_as_text() {
        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"1555","text":{"body":42}}]}}]}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.text, "42");

        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"1555","text":{"body":{"nested":true}}}]}}]}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.text, "");
    }

    #[test]
    fn test_odd_sibling_entry_is_ignored() {
        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"1555","text":{"body":"hi"}}]}}]},{"changes":"x"}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.from, "1555");
        assert_eq!(event.text, "hi");

        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"1555"},"junk"],"contacts":[{"profile":{"name":"Ann"}},7]}}]}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.sender_name, "Ann");
    }

    #[test]
    fn test_zero_reads_as_empty() {
        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"1555","text":{"body":"0"}}]}}]}]}"#;
        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.text, "0");
        assert_eq!(event.reply_text(), "Hi there 👋 You said: (no text)");

        let raw = br#"{"entry":[{"changes":[{"value":{"messages":[{"from":"0","text":{"body":"hi"}}]}}]}]}"#;
        assert_eq!(InboundEvent::parse(raw), Err(InboundError::MissingFrom));
    }

    #[test]
    fn test_non_object_value_has_no_from() {
        let raw = br#"{"entry":[{"changes":[{"value":"abc"}]}]}"#;
        assert_eq!(InboundEvent::parse(raw), Err(InboundError::MissingFrom));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&serde_json::json!([])));
        assert!(is_blank(&serde_json::json!("")));
        assert!(!is_blank(&serde_json::json!({"messages": []})));
    }
}
