use std::io::{self, IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use linebridge_dispatch::Event;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    schema_id: &'a str,
    #[serde(flatten)]
    event: &'a Event,
    source: &'a str,
    timestamp: String,
}

/// Print one event record to stdout.
///
/// Write errors (closed pipe) are returned so the caller's subscriber can
/// report them.
pub fn print_event(event: &Event, source: &str, format: OutputFormat) -> io::Result<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let record = EventOutput {
                schema_id: "https://schemas.linebridge.dev/cli/v1/event.schema.json",
                event,
                source,
                timestamp: now_unix_seconds(),
            };
            let json = serde_json::to_string(&record).map_err(io::Error::other)?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "SOURCE", "CONTENT"])
                .add_row(vec![
                    event.kind().to_string(),
                    source.to_string(),
                    event.to_string(),
                ]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => {
            writeln!(out, "{:<7} {}", event.kind(), event)?;
        }
        OutputFormat::Raw => {
            writeln!(out, "{event}")?;
        }
    }
    out.flush()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
