//! A single server-sent event.

use crate::{StreamError, model::USAGE_EVENT};
use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Write;

/// A decoded or to-be-encoded event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// Value of the `data:` field(s), joined by `\n`.
    pub data: String,
}

impl SseEvent {
    /// Event of the given type with a JSON payload.
    pub fn json<T: Serialize>(event: &str, payload: &T) -> Result<Self, StreamError> {
        Ok(Self { event: Some(event.to_owned()), data: serde_json::to_string(payload)? })
    }

    /// The event type. Unnamed events are `message` events.
    pub fn kind(&self) -> &str {
        self.event.as_deref().unwrap_or(crate::MESSAGE_EVENT)
    }

    /// Whether this is a usage report.
    pub fn is_usage(&self) -> bool {
        self.kind() == USAGE_EVENT
    }

    /// Parse the payload as JSON.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, StreamError> {
        Ok(serde_json::from_str(&self.data)?)
    }

    /// Parse the payload, checking the event type first.
    pub fn parse_as<T: DeserializeOwned>(&self, expected: &'static str) -> Result<T, StreamError> {
        if self.kind() != expected {
            return Err(StreamError::UnexpectedEvent {
                expected,
                actual: self.kind().to_owned(),
            });
        }
        self.parse()
    }

    /// Wire encoding, terminated by a blank line.
    pub fn encode(&self) -> Bytes {
        let mut out = String::with_capacity(self.data.len() + 32);
        if let Some(event) = &self.event {
            let _ = writeln!(out, "event: {event}");
        }
        for line in self.data.split('\n') {
            let _ = writeln!(out, "data: {line}");
        }
        out.push('\n');
        Bytes::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatChunk, MESSAGE_EVENT, TokenUsage};

    #[test]
    fn test_encode_message() {
        let chunk = ChatChunk { content: "hello".into() };
        let event = SseEvent::json(MESSAGE_EVENT, &chunk).unwrap();
        assert_eq!(&event.encode()[..], b"event: message\ndata: {\"content\":\"hello\"}\n\n");
    }

    #[test]
    fn test_encode_multiline_data() {
        let event = SseEvent { event: None, data: "a\nb".into() };
        assert_eq!(&event.encode()[..], b"data: a\ndata: b\n\n");
        assert_eq!(event.kind(), "message");
    }

    #[test]
    fn test_parse_as_checks_type() {
        let event = SseEvent::json(USAGE_EVENT, &TokenUsage::new(20, 14)).unwrap();
        let usage: TokenUsage = event.parse_as(USAGE_EVENT).unwrap();
        assert_eq!(usage.total_tokens, 34);

        let err = event.parse_as::<ChatChunk>(MESSAGE_EVENT).unwrap_err();
        assert!(matches!(err, StreamError::UnexpectedEvent { .. }));
    }
}
