use std::path::PathBuf;

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device for reading and writing.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to a socket endpoint.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The path exists but cannot carry a byte stream.
    #[error("unsupported link endpoint {path}: {reason}")]
    Unsupported { path: PathBuf, reason: &'static str },

    /// An I/O error occurred on the link stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
