use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};

use crate::assembler::{CARRIAGE_RETURN, DELIMITER};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Terminator appended to outgoing lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`, for firmware that expects a carriage return.
    CrLf,
}

impl LineEnding {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => &[DELIMITER],
            LineEnding::CrLf => &[CARRIAGE_RETURN, DELIMITER],
        }
    }
}

/// Writes terminated lines to any `Write` stream.
pub struct LineWriter<T> {
    inner: T,
    buf: BytesMut,
    ending: LineEnding,
}

impl<T: Write> LineWriter<T> {
    /// Create a new line writer terminating lines with `\n`.
    pub fn new(inner: T) -> Self {
        Self::with_ending(inner, LineEnding::default())
    }

    /// Create a new line writer with an explicit line ending.
    pub fn with_ending(inner: T, ending: LineEnding) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            ending,
        }
    }

    /// Write `text` followed by the line ending, then flush.
    ///
    /// `text` must not contain `\n`; the receiver would see two lines.
    pub fn send_line(&mut self, text: &[u8]) -> Result<()> {
        if text.contains(&DELIMITER) {
            return Err(FrameError::EmbeddedDelimiter);
        }

        self.buf.clear();
        self.buf.put_slice(text);
        self.buf.put_slice(self.ending.as_bytes());

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
