use crate::event::EventKind;
use crate::registry::SubscriptionId;

/// Error type subscribers return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by dispatch and by driving a bridge from a reader.
///
/// Subscriber variants are reported through
/// [`DispatchReport`](crate::DispatchReport), never returned from `feed`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A subscriber returned an error.
    #[error("{kind} subscriber {id} failed: {source}")]
    Subscriber {
        id: SubscriptionId,
        kind: EventKind,
        source: BoxError,
    },

    /// A subscriber panicked.
    #[error("{kind} subscriber {id} panicked: {message}")]
    Panicked {
        id: SubscriptionId,
        kind: EventKind,
        message: String,
    },

    /// Reading lines from the link failed.
    #[error("line read failed: {0}")]
    Frame(#[from] linebridge_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
