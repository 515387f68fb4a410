//! Line classification and synchronous event dispatch.
//!
//! Every complete line becomes exactly one [`Event`], unless its bytes are not
//! valid UTF-8, in which case the [`DecodePolicy`] decides (the default drops
//! the line silently):
//! - text that parses as an `f64` becomes [`Event::Value`]
//! - anything else, including the empty string, becomes [`Event::Message`]
//!
//! Events go to the subscribers registered for their kind, in registration
//! order, on the calling thread. A failing or panicking subscriber is logged
//! and skipped; it never stops delivery to the others.

pub mod bridge;
pub mod classify;
pub mod error;
pub mod event;
pub mod registry;

pub use bridge::{Bridge, BridgeStats, FeedSummary};
pub use classify::{classify, classify_text, classify_with, DecodePolicy};
pub use error::{BoxError, DispatchError, Result};
pub use event::{Event, EventKind};
pub use registry::{DispatchReport, SubscriberRegistry, SubscriberResult, SubscriptionId};
