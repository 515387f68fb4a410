use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use linebridge_transport::LinkStream;
use tracing::debug;

use crate::assembler::{Line, LineSplitter};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for [`LineReader`].
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Longest accepted line, line ending excluded. `None` (the default)
    /// means no cap, matching [`LineAssembler`](crate::LineAssembler).
    pub max_line_bytes: Option<usize>,
    /// Read timeout applied to the link by
    /// [`LineReader::with_config_link`]. An expired timeout surfaces as an
    /// `Io` error of kind `TimedOut` or `WouldBlock`; the reader stays usable.
    pub read_timeout: Option<std::time::Duration>,
}

/// Reads complete lines from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete lines.
pub struct LineReader<T> {
    inner: T,
    buf: BytesMut,
    splitter: LineSplitter,
    config: ReaderConfig,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            splitter: LineSplitter::new(config.max_line_bytes),
            config,
        }
    }

    /// Read the next complete line (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` at end of stream; a partial
    /// line still pending at that point is discarded. When a cap is
    /// configured, each line longer than the cap is discarded whole and
    /// reported once as `Err(FrameError::LineTooLong)`; the next call resumes
    /// with the line after it.
    pub fn read_line(&mut self) -> Result<Line> {
        loop {
            match self.splitter.split(&mut self.buf) {
                Ok(Some(line)) => return Ok(line),
                Ok(None) => {}
                Err(size) => {
                    let max = self.splitter.max_line_bytes().unwrap_or_default();
                    return Err(FrameError::LineTooLong { size, max });
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                let pending = self.buf.len();
                if pending > 0 {
                    debug!(pending, "discarding unterminated line at end of stream");
                    self.buf.clear();
                }
                self.splitter.reset();
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes of the current partial line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current line reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

impl<T: Read> Iterator for LineReader<T> {
    type Item = Result<Line>;

    /// Yields lines until end of stream; errors other than end of stream are
    /// yielded once and iteration continues.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_line() {
            Ok(line) => Some(Ok(line)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl LineReader<LinkStream> {
    /// Create a line reader for a `LinkStream` and apply the read timeout
    /// from config.
    pub fn with_config_link(mut inner: LinkStream, config: ReaderConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

fn transport_to_frame_error(err: linebridge_transport::TransportError) -> FrameError {
    match err {
        linebridge_transport::TransportError::Io(io) => FrameError::Io(io),
        linebridge_transport::TransportError::Open { source, .. }
        | linebridge_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
