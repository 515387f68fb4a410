//! Newline line framing over chunked byte streams.
//!
//! Bytes arrive from a link in arbitrary chunks. This crate turns them into
//! complete lines:
//! - `\n` terminates a line
//! - a single `\r` right before the `\n` is stripped with it
//! - bytes after the last `\n` stay pending until more data arrives
//!
//! A pending partial line is never flushed: when the stream ends, it is
//! discarded. Chunk boundaries never change which lines come out.

pub mod assembler;
#[cfg(feature = "async")]
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use assembler::{decode_line, Line, LineAssembler, CARRIAGE_RETURN, DELIMITER};
#[cfg(feature = "async")]
pub use codec::LineCodec;
pub use error::{FrameError, Result};
pub use reader::{LineReader, ReaderConfig};
pub use writer::{LineEnding, LineWriter};
