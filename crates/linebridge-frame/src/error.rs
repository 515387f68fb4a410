/// Errors that can occur while reading or writing lines.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A line exceeds the configured cap. The whole line is discarded.
    #[error("line too long ({size} bytes, max {max})")]
    LineTooLong { size: usize, max: usize },

    /// An outgoing line contains a delimiter byte and would split in two.
    #[error("outgoing line contains an embedded line delimiter")]
    EmbeddedDelimiter,

    /// An I/O error occurred while reading or writing lines.
    #[error("line I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link reached end of stream. Any partial line was discarded.
    #[error("link closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
