use linebridge_frame::{LineEnding, LineWriter};
use linebridge_transport::SerialLink;
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let lines = collect_lines(&args)?;

    let link = SerialLink::open(&args.device).map_err(|err| transport_error("open failed", err))?;
    let ending = if args.crlf {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    };
    let mut writer = LineWriter::with_ending(link, ending);

    for line in &lines {
        writer
            .send_line(line.as_bytes())
            .map_err(|err| frame_error("send failed", err))?;
    }
    debug!(count = lines.len(), device = %args.device.display(), "lines sent");

    Ok(SUCCESS)
}

fn collect_lines(args: &SendArgs) -> CliResult<Vec<String>> {
    if let Some(data) = &args.data {
        return Ok(vec![data.clone()]);
    }

    if let Some(path) = &args.file {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("read {} failed", path.display()), err))?;
        return Ok(contents
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect());
    }

    Err(CliError::new(
        DATA_INVALID,
        "nothing to send: pass --data or --file",
    ))
}
