use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod envinfo;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a device (or stdin) and print classified events.
    Listen(ListenArgs),
    /// Write a single line to a device.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Run local environment and device health checks.
    Doctor(DoctorArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

/// Event channels selectable with `--kinds`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Value,
    Message,
}

/// How to treat lines that are not valid UTF-8.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum InvalidUtf8 {
    /// Drop the line silently.
    #[default]
    Drop,
    /// Replace invalid bytes with U+FFFD and emit a message.
    Lossy,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Device, FIFO, capture file or socket to read; `-` reads stdin.
    #[arg(env = "LINEBRIDGE_DEVICE")]
    pub device: PathBuf,
    /// Only print these event kinds (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub kinds: Option<Vec<KindFilter>>,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Discard a partial line once it exceeds N bytes. Unlimited by default.
    #[arg(long, value_name = "N", env = "LINEBRIDGE_MAX_LINE_BYTES")]
    pub max_line_bytes: Option<usize>,
    /// Handling of lines that are not valid UTF-8.
    #[arg(long, value_name = "MODE", default_value = "drop")]
    pub invalid_utf8: InvalidUtf8,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device, FIFO, file or socket to write to.
    #[arg(env = "LINEBRIDGE_DEVICE")]
    pub device: PathBuf,
    /// Line to send (without line ending).
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Send each line of a file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Terminate lines with CRLF instead of LF.
    #[arg(long)]
    pub crlf: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Device to check for read/write access.
    #[arg(long, env = "LINEBRIDGE_DEVICE")]
    pub device: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}
