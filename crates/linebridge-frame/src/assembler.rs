use bytes::{Bytes, BytesMut};

/// Line terminator.
pub const DELIMITER: u8 = b'\n';

/// Stripped when it immediately precedes [`DELIMITER`].
pub const CARRIAGE_RETURN: u8 = b'\r';

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// A complete line with its line ending removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Bytes,
}

impl Line {
    /// Create a line from bytes that no longer carry a line ending.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The raw line bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the line and return its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for Line {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Split the next complete line off the front of `src`.
///
/// Returns `None` if `src` holds no delimiter yet. On success, consumes the
/// line and its delimiter from the buffer.
pub fn decode_line(src: &mut BytesMut) -> Option<Line> {
    let mut scanned = 0;
    split_line(src, &mut scanned)
}

/// Like [`decode_line`], but skips the first `scanned` bytes, which the caller
/// already knows are delimiter-free. Updates `scanned` for the next call.
pub(crate) fn split_line(src: &mut BytesMut, scanned: &mut usize) -> Option<Line> {
    let start = (*scanned).min(src.len());
    let Some(offset) = src[start..].iter().position(|&b| b == DELIMITER) else {
        *scanned = src.len();
        return None;
    };

    let end = start + offset;
    *scanned = 0;

    let mut line = src.split_to(end + 1);
    line.truncate(end);
    if line.last() == Some(&CARRIAGE_RETURN) {
        line.truncate(end - 1);
    }
    Some(Line::new(line.freeze()))
}

/// Line splitting with an optional length cap, shared by
/// [`LineReader`](crate::LineReader) and the async codec.
///
/// A line is oversized when its content, line ending stripped, exceeds the
/// cap. Oversized lines are rejected whole: once one is detected the splitter
/// discards input up to and including the next delimiter, so no fragment of
/// it ever comes out as a line. The decision depends only on the line itself,
/// never on how its bytes were chunked.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineSplitter {
    max_line_bytes: Option<usize>,
    scanned: usize,
    discarding: bool,
}

impl LineSplitter {
    pub(crate) fn new(max_line_bytes: Option<usize>) -> Self {
        Self {
            max_line_bytes,
            scanned: 0,
            discarding: false,
        }
    }

    pub(crate) fn max_line_bytes(&self) -> Option<usize> {
        self.max_line_bytes
    }

    /// Split the next acceptable line off `src`.
    ///
    /// `Ok(None)` means more input is needed. `Err(size)` reports one
    /// oversized line exactly once; `size` is the number of bytes seen when it
    /// was rejected.
    pub(crate) fn split(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<Line>, usize> {
        if self.discarding {
            match src.iter().position(|&b| b == DELIMITER) {
                Some(pos) => {
                    let _ = src.split_to(pos + 1);
                    self.discarding = false;
                    self.scanned = 0;
                }
                None => {
                    src.clear();
                    self.scanned = 0;
                    return Ok(None);
                }
            }
        }

        let Some(max) = self.max_line_bytes else {
            return Ok(split_line(src, &mut self.scanned));
        };

        match split_line(src, &mut self.scanned) {
            Some(line) if line.len() > max => Err(line.len()),
            Some(line) => Ok(Some(line)),
            // One trailing `\r` may still be stripped, so a partial line only
            // proves oversized once it exceeds the cap by more than that.
            None if src.len() > max.saturating_add(1) => {
                let size = src.len();
                src.clear();
                self.scanned = 0;
                self.discarding = true;
                Err(size)
            }
            None => Ok(None),
        }
    }

    /// Forget the partial line and any discard in progress.
    pub(crate) fn reset(&mut self) {
        self.scanned = 0;
        self.discarding = false;
    }
}

/// Accumulates chunked bytes and yields complete lines.
///
/// One assembler serves one stream. Callers feeding it from several threads
/// must serialise `feed` themselves.
///
/// There is no length cap: a stream without delimiters grows the pending
/// buffer without bound. Integrations that need a cap configure one on
/// [`LineReader`](crate::LineReader) instead.
#[derive(Debug)]
pub struct LineAssembler {
    buf: BytesMut,
    // Prefix of `buf` already known to contain no delimiter.
    scanned: usize,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
        }
    }

    /// Append `chunk` and return every line it completes, in arrival order.
    ///
    /// An empty result is normal: the chunk only extended a partial line.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Line> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(line) = split_line(&mut self.buf, &mut self.scanned) {
            lines.push(line);
        }
        lines
    }

    /// Number of bytes waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Discard the pending partial line.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.scanned = 0;
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
