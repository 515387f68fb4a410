use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::error::{BoxError, DispatchError};
use crate::event::{Event, EventKind};

/// What a subscriber returns. `Err` is logged and counted, nothing more.
pub type SubscriberResult = std::result::Result<(), BoxError>;

type ValueCallback = Box<dyn FnMut(f64) -> SubscriberResult + Send>;
type MessageCallback = Box<dyn FnMut(&str) -> SubscriberResult + Send>;

/// Handle returned on registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of delivering one event.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Subscribers that returned `Ok`.
    pub delivered: usize,
    /// Subscribers that returned `Err` or panicked, in call order.
    pub failures: Vec<DispatchError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Per-kind ordered lists of subscriber callbacks.
///
/// Callbacks run synchronously on the dispatching thread, in registration
/// order. The registry is owned by one dispatcher; share it across threads
/// behind a `Mutex` if needed.
pub struct SubscriberRegistry {
    next_id: u64,
    values: Vec<(SubscriptionId, ValueCallback)>,
    messages: Vec<(SubscriptionId, MessageCallback)>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            values: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Subscribe to numeric values.
    pub fn on_value<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(f64) -> SubscriberResult + Send + 'static,
    {
        let id = self.allocate_id();
        self.values.push((id, Box::new(callback)));
        id
    }

    /// Subscribe to text messages.
    pub fn on_message<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&str) -> SubscriberResult + Send + 'static,
    {
        let id = self.allocate_id();
        self.messages.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.values.len() + self.messages.len();
        self.values.retain(|(sub, _)| *sub != id);
        self.messages.retain(|(sub, _)| *sub != id);
        before != self.values.len() + self.messages.len()
    }

    /// Remove every subscription.
    pub fn clear(&mut self) {
        self.values.clear();
        self.messages.clear();
    }

    /// Number of subscribers for `kind`.
    pub fn len(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Value => self.values.len(),
            EventKind::Message => self.messages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.messages.is_empty()
    }

    /// Deliver `event` to every subscriber of its kind.
    ///
    /// Failures are isolated per subscriber: each is logged, recorded in the
    /// report, and the remaining subscribers still run.
    pub fn dispatch(&mut self, event: &Event) -> DispatchReport {
        let mut report = DispatchReport::default();
        match event {
            Event::Value { amount } => {
                for (id, callback) in &mut self.values {
                    let outcome = catch_unwind(AssertUnwindSafe(|| callback(*amount)));
                    record(&mut report, *id, EventKind::Value, outcome);
                }
            }
            Event::Message { text } => {
                for (id, callback) in &mut self.messages {
                    let outcome = catch_unwind(AssertUnwindSafe(|| callback(text.as_str())));
                    record(&mut report, *id, EventKind::Message, outcome);
                }
            }
        }
        report
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("values", &self.values.len())
            .field("messages", &self.messages.len())
            .finish()
    }
}

fn record(
    report: &mut DispatchReport,
    id: SubscriptionId,
    kind: EventKind,
    outcome: std::thread::Result<SubscriberResult>,
) {
    let failure = match outcome {
        Ok(Ok(())) => {
            report.delivered += 1;
            return;
        }
        Ok(Err(source)) => DispatchError::Subscriber { id, kind, source },
        Err(payload) => DispatchError::Panicked {
            id,
            kind,
            message: panic_message(payload.as_ref()),
        },
    };
    warn!(%id, %kind, error = %failure, "subscriber failed");
    report.failures.push(failure);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
