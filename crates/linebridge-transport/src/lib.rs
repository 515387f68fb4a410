//! Read/write link abstraction over serial device nodes.
//!
//! The link layer opens an endpoint for simultaneous read and write access
//! and hands back a [`LinkStream`]:
//! - serial terminals such as `/dev/ttyUSB0` or `/dev/ttyACM0`, switched to
//!   raw mode at a fixed 9600 8N1 line setting
//! - regular files and FIFOs (captures, `mkfifo` taps)
//! - Unix domain sockets exposed by serial bridges (Linux/macOS)
//!
//! This is the lowest layer of linebridge. Opening failures are reported as
//! [`TransportError`] values, never as panics.

pub mod error;
pub mod serial;
pub mod stream;

pub use error::{Result, TransportError};
pub use serial::{EndpointKind, SerialLink, DEFAULT_BAUD_RATE};
pub use stream::LinkStream;
