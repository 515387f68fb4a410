use std::fmt;

use serde::Serialize;

/// A classified line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    /// The line parsed as a floating point number.
    Value { amount: f64 },
    /// Any other decoded line, verbatim.
    Message { text: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Value { .. } => EventKind::Value,
            Event::Message { .. } => EventKind::Message,
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            Event::Value { amount } => Some(*amount),
            Event::Message { .. } => None,
        }
    }

    pub fn as_message(&self) -> Option<&str> {
        match self {
            Event::Value { .. } => None,
            Event::Message { text } => Some(text),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Value { amount } => write!(f, "{amount}"),
            Event::Message { text } => f.write_str(text),
        }
    }
}

/// The two event channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Value,
    Message,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Value => "value",
            EventKind::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let value = serde_json::to_string(&Event::Value { amount: 12.5 }).unwrap();
        assert_eq!(value, r#"{"kind":"value","amount":12.5}"#);

        let message = serde_json::to_string(&Event::Message {
            text: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(message, r#"{"kind":"message","text":"hello"}"#);
    }

    #[test]
    fn accessors_match_kind() {
        let value = Event::Value { amount: -3.0 };
        assert_eq!(value.kind(), EventKind::Value);
        assert_eq!(value.as_value(), Some(-3.0));
        assert_eq!(value.as_message(), None);

        let message = Event::Message {
            text: String::new(),
        };
        assert_eq!(message.kind(), EventKind::Message);
        assert_eq!(message.as_message(), Some(""));
        assert_eq!(message.to_string(), "");
    }
}
