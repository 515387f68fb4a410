//! Turn a serial byte stream into classified value and message events.
//!
//! Feed raw chunks from a link into a [`dispatch::Bridge`]; every complete
//! line comes back as a numeric value or a text message, delivered to the
//! subscribers registered for that kind.
//!
//! # Crate Structure
//!
//! - [`transport`]: Opening device nodes and sockets for read/write
//! - [`frame`]: Newline line framing (`LineAssembler`, `LineReader`, `LineWriter`)
//! - [`dispatch`]: Classification, subscriber registry and the `Bridge` pipeline
//!
//! ```
//! use linebridge::dispatch::Bridge;
//!
//! let mut bridge = Bridge::new();
//! bridge.on_value(|v| {
//!     println!("value {v}");
//!     Ok(())
//! });
//! bridge.on_message(|m| {
//!     println!("message {m}");
//!     Ok(())
//! });
//!
//! bridge.feed(b"12.5\r\nhe");
//! let summary = bridge.feed(b"llo\r\n-3\r\n");
//! assert_eq!(summary.events, 2);
//! ```

/// Re-export transport types.
pub mod transport {
    pub use linebridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use linebridge_frame::*;
}

/// Re-export dispatch types.
pub mod dispatch {
    pub use linebridge_dispatch::*;
}
