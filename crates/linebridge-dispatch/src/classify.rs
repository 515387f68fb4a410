use std::borrow::Cow;

use tracing::debug;

use crate::event::Event;

/// What to do with a line whose bytes are not valid UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Drop the line: no event, no error. Tolerates transport noise.
    #[default]
    Drop,
    /// Replace invalid sequences with U+FFFD and classify the result.
    Lossy,
}

impl DecodePolicy {
    /// Decode `bytes`, or `None` if the policy drops them.
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Some(Cow::Borrowed(text)),
            Err(err) => match self {
                DecodePolicy::Drop => {
                    debug!(len = bytes.len(), %err, "dropping line with invalid UTF-8");
                    None
                }
                DecodePolicy::Lossy => Some(String::from_utf8_lossy(bytes)),
            },
        }
    }
}

/// Classify decoded text.
///
/// The whole string must parse as an `f64` (Rust's locale-independent
/// syntax: optional sign, digits, optional point, optional exponent, plus
/// `inf`/`infinity`/`nan`). Nothing is trimmed.
pub fn classify_text(text: &str) -> Event {
    match text.parse::<f64>() {
        Ok(amount) => Event::Value { amount },
        Err(_) => Event::Message {
            text: text.to_owned(),
        },
    }
}

/// Classify a line's bytes with the default [`DecodePolicy::Drop`].
///
/// `None` means the line was not valid UTF-8 and was dropped.
pub fn classify(line: &[u8]) -> Option<Event> {
    classify_with(line, DecodePolicy::Drop)
}

/// Classify a line's bytes under an explicit decode policy.
pub fn classify_with(line: &[u8], policy: DecodePolicy) -> Option<Event> {
    policy.decode(line).map(|text| classify_text(&text))
}
