use std::io::{self, ErrorKind};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use linebridge_dispatch::{Bridge, DecodePolicy, Event, SubscriberResult};
use linebridge_frame::{FrameError, LineReader, ReaderConfig};
use linebridge_transport::{LinkStream, SerialLink};
use tracing::{debug, info, warn};

use crate::cmd::{InvalidUtf8, KindFilter, ListenArgs};
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_event, OutputFormat};

// How often an idle link is checked for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Printing state shared by the subscribers and the read loop.
#[derive(Default)]
struct Printer {
    printed: AtomicUsize,
    failed: Mutex<Option<io::Error>>,
}

impl Printer {
    fn emit(&self, event: &Event, source: &str, format: OutputFormat) -> SubscriberResult {
        match print_event(event, source, format) {
            Ok(()) => {
                self.printed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(err) => {
                let kind = err.kind();
                if let Ok(mut failed) = self.failed.lock() {
                    failed.get_or_insert(err);
                }
                Err(io::Error::from(kind).into())
            }
        }
    }

    fn take_failure(&self) -> Option<io::Error> {
        self.failed.lock().ok().and_then(|mut failed| failed.take())
    }

    fn printed(&self) -> usize {
        self.printed.load(Ordering::SeqCst)
    }
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let (link, name) = open_source(&args.device)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let printer = Arc::new(Printer::default());
    let mut bridge = Bridge::with_policy(match args.invalid_utf8 {
        InvalidUtf8::Drop => DecodePolicy::Drop,
        InvalidUtf8::Lossy => DecodePolicy::Lossy,
    });

    if wants(&args.kinds, KindFilter::Value) {
        let printer = Arc::clone(&printer);
        let name = name.clone();
        bridge.on_value(move |amount| printer.emit(&Event::Value { amount }, &name, format));
    }
    if wants(&args.kinds, KindFilter::Message) {
        let printer = Arc::clone(&printer);
        let name = name.clone();
        bridge.on_message(move |text| {
            let event = Event::Message {
                text: text.to_owned(),
            };
            printer.emit(&event, &name, format)
        });
    }

    let config = ReaderConfig {
        max_line_bytes: args.max_line_bytes,
        read_timeout: Some(POLL_INTERVAL),
    };
    let mut reader = LineReader::with_config_link(link, config)
        .map_err(|err| frame_error("link setup failed", err))?;

    while running.load(Ordering::SeqCst) {
        match reader.read_line() {
            Ok(line) => {
                bridge.process_line(&line);
            }
            Err(FrameError::ConnectionClosed) => {
                debug!(source = %name, "end of stream");
                break;
            }
            Err(FrameError::Io(err)) if is_idle(&err) => continue,
            Err(err @ FrameError::LineTooLong { .. }) => {
                warn!(error = %err, "discarded oversized line");
                continue;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        }

        if let Some(err) = printer.take_failure() {
            return Err(io_error("write failed", err));
        }
        if let Some(count) = args.count {
            if printer.printed() >= count {
                break;
            }
        }
    }

    let stats = bridge.stats();
    info!(
        lines = stats.lines,
        values = stats.values,
        messages = stats.messages,
        dropped = stats.dropped,
        subscriber_failures = stats.subscriber_failures,
        interrupted = !running.load(Ordering::SeqCst),
        "listen finished"
    );

    Ok(SUCCESS)
}

fn is_idle(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

fn wants(kinds: &Option<Vec<KindFilter>>, kind: KindFilter) -> bool {
    kinds.as_ref().is_none_or(|kinds| kinds.contains(&kind))
}

fn open_source(device: &Path) -> CliResult<(LinkStream, String)> {
    if device.as_os_str() == "-" {
        let link = LinkStream::stdin().map_err(|err| transport_error("stdin unavailable", err))?;
        return Ok((link, "stdin".to_string()));
    }

    let link = SerialLink::open(device).map_err(|err| transport_error("open failed", err))?;
    Ok((link, device.display().to_string()))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
