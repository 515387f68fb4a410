use std::fs::OpenOptions;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::{LinkStream, BLOCKING_READ_TIMEOUT};

/// Line speed used by [`SerialLink::open`]: 9600 baud, 8N1, no flow control.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// What kind of filesystem object a link path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// A character device (`/dev/tty*`, `/dev/cu.*`, pty slaves).
    CharDevice,
    /// A named pipe.
    Fifo,
    /// A Unix domain socket (e.g. a serial-over-network bridge).
    Socket,
    /// A regular file, typically a capture.
    File,
}

impl EndpointKind {
    /// Human-readable name for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointKind::CharDevice => "char-device",
            EndpointKind::Fifo => "fifo",
            EndpointKind::Socket => "socket",
            EndpointKind::File => "file",
        }
    }
}

/// Opens link endpoints for simultaneous read and write access.
///
/// Serial terminals are switched to raw mode so the byte stream reaches the
/// framing layer unmodified: no `\r` to `\n` translation, no echo back to the
/// device.
pub struct SerialLink;

impl SerialLink {
    /// Open any supported endpoint for reading and writing.
    ///
    /// Character devices are opened as serial ports, sockets are connected,
    /// everything else is opened as a file. Failure is returned as an error;
    /// nothing here aborts the process.
    pub fn open(path: impl AsRef<Path>) -> Result<LinkStream> {
        let path = path.as_ref();
        match Self::endpoint_kind(path)? {
            EndpointKind::Socket => Self::connect(path),
            EndpointKind::CharDevice => Self::open_serial(path, DEFAULT_BAUD_RATE),
            kind => {
                debug!(?path, kind = kind.as_str(), "opening link endpoint");
                Self::open_device(path)
            }
        }
    }

    /// Open a serial terminal in raw mode at `baud_rate`.
    ///
    /// Character devices that are not terminals (`/dev/null`, `/dev/zero`)
    /// have no line settings and are opened as plain files instead.
    pub fn open_serial(path: impl AsRef<Path>, baud_rate: u32) -> Result<LinkStream> {
        let path = path.as_ref();
        let port = serialport::new(path.to_string_lossy(), baud_rate)
            .timeout(BLOCKING_READ_TIMEOUT)
            .open();

        match port {
            Ok(port) => {
                info!(?path, baud_rate, "opened serial port in raw mode");
                Ok(LinkStream::from_serial(port))
            }
            Err(err) => {
                let link = Self::open_device(path)?;
                if link.is_terminal() {
                    return Err(TransportError::Open {
                        path: path.to_path_buf(),
                        source: err.into(),
                    });
                }
                debug!(?path, error = %err, "not a terminal, using plain device access");
                Ok(link)
            }
        }
    }

    /// Open a device node, FIFO or file with read and write access.
    ///
    /// Terminal settings are left untouched; use [`open_serial`](Self::open_serial)
    /// for serial ports.
    ///
    /// On Unix the descriptor is opened with `O_NOCTTY` so a tty device never
    /// becomes the controlling terminal of this process.
    pub fn open_device(path: impl AsRef<Path>) -> Result<LinkStream> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.read(true).write(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOCTTY);
        }

        let file = options.open(path).map_err(|e| TransportError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(?path, "opened link for read/write");
        Ok(LinkStream::from_file(file))
    }

    /// Connect to a Unix domain socket endpoint (blocking).
    #[cfg(unix)]
    pub fn connect(path: impl AsRef<Path>) -> Result<LinkStream> {
        let path = path.as_ref();
        let stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
                path: path.to_path_buf(),
                source: e,
            })?;
        info!(?path, "connected to socket link");
        Ok(LinkStream::from_unix(stream))
    }

    /// Socket endpoints are only available on Unix.
    #[cfg(not(unix))]
    pub fn connect(path: impl AsRef<Path>) -> Result<LinkStream> {
        Err(TransportError::Unsupported {
            path: path.as_ref().to_path_buf(),
            reason: "socket links require a unix platform",
        })
    }

    /// Classify the endpoint at `path` without opening it.
    pub fn endpoint_kind(path: impl AsRef<Path>) -> Result<EndpointKind> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| TransportError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_type = metadata.file_type();

        if file_type.is_dir() {
            return Err(TransportError::Unsupported {
                path: path.to_path_buf(),
                reason: "path is a directory",
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_char_device() {
                return Ok(EndpointKind::CharDevice);
            }
            if file_type.is_fifo() {
                return Ok(EndpointKind::Fifo);
            }
            if file_type.is_socket() {
                return Ok(EndpointKind::Socket);
            }
            if file_type.is_block_device() {
                return Err(TransportError::Unsupported {
                    path: path.to_path_buf(),
                    reason: "block devices are not byte streams",
                });
            }
        }

        Ok(EndpointKind::File)
    }
}
