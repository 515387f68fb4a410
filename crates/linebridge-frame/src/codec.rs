use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::assembler::{Line, LineSplitter, DELIMITER};
use crate::error::{FrameError, Result};

/// `tokio_util` codec over newline-delimited lines.
///
/// Decoding follows [`LineAssembler`](crate::LineAssembler) exactly. At end
/// of stream an unterminated tail is discarded rather than reported as an
/// error.
#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    splitter: LineSplitter,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject lines longer than `max` bytes.
    ///
    /// An oversized line yields one `LineTooLong` error; the rest of it, up
    /// to and including its delimiter, is dropped and decoding resumes with
    /// the following line.
    pub fn with_max_line_bytes(max: usize) -> Self {
        Self {
            splitter: LineSplitter::new(Some(max)),
        }
    }
}

impl Decoder for LineCodec {
    type Item = Line;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Line>> {
        let max = self.splitter.max_line_bytes().unwrap_or_default();
        self.splitter
            .split(src)
            .map_err(|size| FrameError::LineTooLong { size, max })
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Line>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if !src.is_empty() {
            debug!(pending = src.len(), "discarding unterminated line at end of stream");
            src.clear();
        }
        self.splitter.reset();
        Ok(None)
    }
}

impl Encoder<&[u8]> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        if item.contains(&DELIMITER) {
            return Err(FrameError::EmbeddedDelimiter);
        }
        dst.reserve(item.len() + 1);
        dst.put_slice(item);
        dst.put_u8(DELIMITER);
        Ok(())
    }
}
