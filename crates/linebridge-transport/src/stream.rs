use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Timeout used on serial ports when no read timeout is requested.
pub(crate) const BLOCKING_READ_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// An open link; implements Read + Write.
///
/// Returned by [`SerialLink`](crate::SerialLink) operations. Wraps a serial
/// port in raw mode, a plain file handle (FIFOs, captures, non-terminal
/// devices) or, on Unix, a connected socket stream.
pub struct LinkStream {
    inner: LinkStreamInner,
    // File-backed links wait for readiness with poll(2) before each read.
    read_timeout: Option<Duration>,
}

enum LinkStreamInner {
    File(std::fs::File),
    Serial(Box<dyn serialport::SerialPort>),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::File(file) => {
                wait_readable(file, self.read_timeout)?;
                file.read(buf)
            }
            LinkStreamInner::Serial(port) => port.read(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkStreamInner::File(file) => file.write(buf),
            LinkStreamInner::Serial(port) => port.write(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            LinkStreamInner::File(file) => file.flush(),
            LinkStreamInner::Serial(port) => port.flush(),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl LinkStream {
    fn new(inner: LinkStreamInner) -> Self {
        Self {
            inner,
            read_timeout: None,
        }
    }

    pub(crate) fn from_file(file: std::fs::File) -> Self {
        Self::new(LinkStreamInner::File(file))
    }

    pub(crate) fn from_serial(port: Box<dyn serialport::SerialPort>) -> Self {
        Self::new(LinkStreamInner::Serial(port))
    }

    /// Wrap a connected Unix stream.
    ///
    /// Also useful for tests: `UnixStream::pair()` gives an in-process link.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self::new(LinkStreamInner::Unix(stream))
    }

    /// Duplicate this process's standard input as a link, so read timeouts
    /// apply to piped input too.
    pub fn stdin() -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::fd::AsFd;
            let fd = std::io::stdin().as_fd().try_clone_to_owned()?;
            Ok(Self::from_file(std::fs::File::from(fd)))
        }
        #[cfg(windows)]
        {
            use std::os::windows::io::AsHandle;
            let handle = std::io::stdin().as_handle().try_clone_to_owned()?;
            Ok(Self::from_file(std::fs::File::from(handle)))
        }
        #[cfg(not(any(unix, windows)))]
        {
            Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "stdin links are not available on this platform",
            )
            .into())
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Lets one thread own the read half while another writes.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            LinkStreamInner::File(file) => LinkStreamInner::File(file.try_clone()?),
            LinkStreamInner::Serial(port) => {
                LinkStreamInner::Serial(port.try_clone().map_err(std::io::Error::from)?)
            }
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => LinkStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self {
            inner,
            read_timeout: self.read_timeout,
        })
    }

    /// Set the read timeout. `None` blocks until data arrives.
    ///
    /// An expired timeout makes `read` fail with `TimedOut` (serial ports,
    /// file-backed links) or `WouldBlock` (sockets); the link stays usable.
    /// Windows file handles cannot wait with a timeout and ignore it.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.read_timeout = timeout;
        match &mut self.inner {
            LinkStreamInner::File(_) => {
                if cfg!(not(unix)) && timeout.is_some() {
                    tracing::debug!("read timeout ignored for file-backed link");
                }
                Ok(())
            }
            LinkStreamInner::Serial(port) => port
                .set_timeout(timeout.unwrap_or(BLOCKING_READ_TIMEOUT))
                .map_err(|err| std::io::Error::from(err).into()),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        use std::io::IsTerminal;
        match &self.inner {
            LinkStreamInner::File(file) => file.is_terminal(),
            LinkStreamInner::Serial(_) => true,
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => false,
        }
    }

    /// Short name of the backing endpoint kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            LinkStreamInner::File(_) => "file",
            LinkStreamInner::Serial(_) => "serial",
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => "unix",
        }
    }
}

#[cfg(unix)]
fn wait_readable(file: &std::fs::File, timeout: Option<Duration>) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let Some(timeout) = timeout else {
        return Ok(());
    };

    let mut fds = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    // SAFETY: `fds` is one valid pollfd that outlives the call.
    let ready = unsafe { libc::poll(&mut fds, 1, millis) };
    match ready {
        -1 => Err(std::io::Error::last_os_error()),
        0 => Err(std::io::Error::from(std::io::ErrorKind::TimedOut)),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn wait_readable(_file: &std::fs::File, _timeout: Option<Duration>) -> std::io::Result<()> {
    Ok(())
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("type", &self.kind())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
