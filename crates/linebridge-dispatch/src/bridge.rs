use std::io::Read;

use linebridge_frame::{FrameError, Line, LineAssembler, LineReader, ReaderConfig};
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{classify_with, DecodePolicy};
use crate::error::Result;
use crate::event::Event;
use crate::registry::{SubscriberRegistry, SubscriberResult, SubscriptionId};

/// What one `feed` call produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Lines completed by the chunk.
    pub lines: usize,
    /// Events dispatched (one per line that survived decoding).
    pub events: usize,
    /// Lines dropped by the decode policy.
    pub dropped: usize,
    /// Subscriber calls that failed or panicked.
    pub subscriber_failures: usize,
}

/// Counters accumulated over a bridge's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    pub lines: u64,
    pub values: u64,
    pub messages: u64,
    pub dropped: u64,
    pub subscriber_failures: u64,
}

/// Byte stream in, classified events out.
///
/// Owns a [`LineAssembler`] for one stream, classifies each completed line
/// and dispatches the event to its [`SubscriberRegistry`]. Everything runs on
/// the caller's thread; events reach subscribers in line order before
/// [`feed`](Self::feed) returns. Dropping the bridge discards any partial
/// line and all subscriptions.
#[derive(Debug, Default)]
pub struct Bridge {
    assembler: LineAssembler,
    registry: SubscriberRegistry,
    policy: DecodePolicy,
    stats: BridgeStats,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit decode policy instead of [`DecodePolicy::Drop`].
    pub fn with_policy(policy: DecodePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Start from a registry populated elsewhere.
    pub fn with_registry(registry: SubscriberRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn on_value<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(f64) -> SubscriberResult + Send + 'static,
    {
        self.registry.on_value(callback)
    }

    pub fn on_message<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&str) -> SubscriberResult + Send + 'static,
    {
        self.registry.on_message(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    pub fn clear_subscribers(&mut self) {
        self.registry.clear();
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SubscriberRegistry {
        &mut self.registry
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Feed a chunk and dispatch an event for every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> FeedSummary {
        let lines = self.assembler.feed(chunk);
        let mut summary = FeedSummary {
            lines: lines.len(),
            ..FeedSummary::default()
        };

        for line in &lines {
            match self.classify_line(line) {
                Some(event) => {
                    summary.events += 1;
                    summary.subscriber_failures += self.dispatch(&event);
                }
                None => summary.dropped += 1,
            }
        }
        summary
    }

    /// Feed a chunk and return the events instead of dispatching them.
    ///
    /// Stats are updated; subscribers are not called.
    pub fn drain_events(&mut self, chunk: &[u8]) -> Vec<Event> {
        let lines = self.assembler.feed(chunk);
        lines
            .iter()
            .filter_map(|line| self.classify_line(line))
            .collect()
    }

    /// Classify and dispatch one already-framed line.
    ///
    /// Returns the event, or `None` if the decode policy dropped the line.
    pub fn process_line(&mut self, line: &Line) -> Option<Event> {
        let event = self.classify_line(line)?;
        self.dispatch(&event);
        Some(event)
    }

    /// Drive the bridge from a reader until end of stream.
    ///
    /// A partial line pending at end of stream is discarded. Oversized lines
    /// (only possible with a cap in `config`) are logged and skipped; other
    /// read errors stop the loop.
    pub fn run<R: Read>(&mut self, reader: R, config: ReaderConfig) -> Result<BridgeStats> {
        let mut reader = LineReader::with_config(reader, config);
        loop {
            match reader.read_line() {
                Ok(line) => {
                    self.process_line(&line);
                }
                Err(FrameError::ConnectionClosed) => return Ok(self.stats),
                Err(err @ FrameError::LineTooLong { .. }) => {
                    warn!(error = %err, "skipping oversized line");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Bytes waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.assembler.pending()
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    fn classify_line(&mut self, line: &Line) -> Option<Event> {
        self.stats.lines += 1;
        match classify_with(line.as_bytes(), self.policy) {
            Some(event) => {
                match event {
                    Event::Value { .. } => self.stats.values += 1,
                    Event::Message { .. } => self.stats.messages += 1,
                }
                Some(event)
            }
            None => {
                self.stats.dropped += 1;
                None
            }
        }
    }

    fn dispatch(&mut self, event: &Event) -> usize {
        let report = self.registry.dispatch(event);
        let failures = report.failures.len();
        if failures > 0 {
            debug!(failures, kind = %event.kind(), "dispatch completed with failures");
        }
        self.stats.subscriber_failures += failures as u64;
        failures
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Value(f64),
        Message(String),
    }

    fn recording_bridge() -> (Bridge, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bridge = Bridge::new();
        {
            let seen = Arc::clone(&seen);
            bridge.on_value(move |v| {
                seen.lock().unwrap().push(Seen::Value(v));
                Ok(())
            });
        }
        {
            let seen = Arc::clone(&seen);
            bridge.on_message(move |m| {
                seen.lock().unwrap().push(Seen::Message(m.to_string()));
                Ok(())
            });
        }
        (bridge, seen)
    }

    #[test]
    fn crlf_stream_split_mid_line() {
        let (mut bridge, seen) = recording_bridge();
        bridge.feed(b"12.5\r\nhe");
        bridge.feed(b"llo\r\n-3\r\n");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Seen::Value(12.5),
                Seen::Message("hello".to_string()),
                Seen::Value(-3.0)
            ]
        );
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn value_then_message_in_one_or_two_chunks() {
        let expected = vec![Seen::Value(3.14), Seen::Message("hello".to_string())];

        let (mut one, seen_one) = recording_bridge();
        one.feed(b"3.14\nhello\n");
        assert_eq!(*seen_one.lock().unwrap(), expected);

        let (mut two, seen_two) = recording_bridge();
        two.feed(b"3.14\n");
        two.feed(b"hello\n");
        assert_eq!(*seen_two.lock().unwrap(), expected);
    }

    #[test]
    fn unterminated_input_never_emits() {
        let (mut bridge, seen) = recording_bridge();
        let summary = bridge.feed(b"42");
        assert_eq!(summary, FeedSummary::default());
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(bridge.pending(), 2);
    }

    #[test]
    fn bare_crlf_is_one_empty_message() {
        let (mut bridge, seen) = recording_bridge();
        let summary = bridge.feed(b"\r\n");
        assert_eq!(summary.events, 1);
        assert_eq!(*seen.lock().unwrap(), vec![Seen::Message(String::new())]);
    }

    #[test]
    fn invalid_utf8_line_is_dropped_and_stream_continues() {
        let (mut bridge, seen) = recording_bridge();
        let summary = bridge.feed(b"1\n\xff\xfe\x00\n2\n");

        assert_eq!(
            summary,
            FeedSummary {
                lines: 3,
                events: 2,
                dropped: 1,
                subscriber_failures: 0,
            }
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Seen::Value(1.0), Seen::Value(2.0)]
        );
        assert_eq!(bridge.stats().dropped, 1);
    }

    #[test]
    fn lossy_policy_emits_replacement_text() {
        let mut bridge = Bridge::with_policy(DecodePolicy::Lossy);
        let events = bridge.drain_events(b"a\xffb\n");
        assert_eq!(
            events,
            vec![Event::Message {
                text: "a\u{FFFD}b".to_string()
            }]
        );
    }

    #[test]
    fn bytewise_and_whole_feeds_agree() {
        let input: &[u8] = b"1.0\r\nalpha\n\n\xc3\x28\n-7e2\r\nbeta\r\ntail";

        let mut whole = Bridge::new();
        let expected = whole.drain_events(input);

        let mut bytewise = Bridge::new();
        let mut events = Vec::new();
        for b in input {
            events.extend(bytewise.drain_events(std::slice::from_ref(b)));
        }

        assert_eq!(events, expected);
        assert_eq!(
            expected,
            vec![
                Event::Value { amount: 1.0 },
                Event::Message {
                    text: "alpha".to_string()
                },
                Event::Message {
                    text: String::new()
                },
                Event::Value { amount: -700.0 },
                Event::Message {
                    text: "beta".to_string()
                },
            ]
        );
    }

    #[test]
    fn subscriber_failures_are_counted_not_propagated() {
        let (mut bridge, seen) = recording_bridge();
        bridge.on_value(|_| Err("plot closed".into()));
        bridge.on_value(|_| panic!("boom"));

        let summary = bridge.feed(b"5\nok\n");
        assert_eq!(summary.events, 2);
        assert_eq!(summary.subscriber_failures, 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Seen::Value(5.0), Seen::Message("ok".to_string())]
        );
        assert_eq!(bridge.stats().subscriber_failures, 2);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let (mut bridge, seen) = recording_bridge();
        let extra = Arc::new(Mutex::new(0usize));
        let id = {
            let extra = Arc::clone(&extra);
            bridge.on_message(move |_| {
                *extra.lock().unwrap() += 1;
                Ok(())
            })
        };

        bridge.feed(b"x\n");
        assert!(bridge.unsubscribe(id));
        bridge.feed(b"y\n");

        assert_eq!(*extra.lock().unwrap(), 1);
        assert_eq!(seen.lock().unwrap().len(), 2);

        bridge.clear_subscribers();
        bridge.feed(b"z\n");
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(bridge.stats().messages, 3);
    }

    #[test]
    fn process_line_returns_dispatched_event() {
        let (mut bridge, seen) = recording_bridge();
        let event = bridge.process_line(&Line::new(&b"0.5"[..])).unwrap();
        assert_eq!(event, Event::Value { amount: 0.5 });
        assert_eq!(*seen.lock().unwrap(), vec![Seen::Value(0.5)]);
        assert!(bridge.process_line(&Line::new(&b"\xff"[..])).is_none());
    }

    #[test]
    fn run_drives_reader_to_end_of_stream() {
        let (mut bridge, seen) = recording_bridge();
        let stats = bridge
            .run(
                Cursor::new(b"1\r\nready\r\n\xff\r\n2.5\r\npartial".to_vec()),
                ReaderConfig::default(),
            )
            .unwrap();

        assert_eq!(
            stats,
            BridgeStats {
                lines: 4,
                values: 2,
                messages: 1,
                dropped: 1,
                subscriber_failures: 0,
            }
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Seen::Value(1.0),
                Seen::Message("ready".to_string()),
                Seen::Value(2.5)
            ]
        );
    }

    #[test]
    fn run_skips_oversized_lines() {
        let (mut bridge, seen) = recording_bridge();
        let config = ReaderConfig {
            max_line_bytes: Some(4),
            ..ReaderConfig::default()
        };
        let stats = bridge
            .run(Cursor::new(b"way-too-long-line".to_vec()), config)
            .unwrap();
        assert_eq!(stats.lines, 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn bridge_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Bridge>();
    }
}
