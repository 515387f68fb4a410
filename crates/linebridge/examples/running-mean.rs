//! Print a running mean of the numeric lines arriving on stdin.
//!
//! Text lines are echoed to stderr as board messages.
//!
//! Run with:
//!   printf '1\r\n2\r\nboot ok\r\n3\r\n' | cargo run --example running-mean

use std::io::Read;
use std::sync::{Arc, Mutex};

use linebridge::dispatch::Bridge;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let totals = Arc::new(Mutex::new((0u64, 0.0f64)));

    let mut bridge = Bridge::new();
    {
        let totals = Arc::clone(&totals);
        bridge.on_value(move |value| {
            let mut totals = totals.lock().map_err(|_| "totals lock poisoned")?;
            totals.0 += 1;
            totals.1 += value;
            println!("{value} (mean {:.3})", totals.1 / totals.0 as f64);
            Ok(())
        });
    }
    bridge.on_message(|text| {
        eprintln!("board: {text}");
        Ok(())
    });

    let mut stdin = std::io::stdin().lock();
    let mut chunk = [0u8; 256];
    loop {
        let n = stdin.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bridge.feed(&chunk[..n]);
    }

    let stats = bridge.stats();
    eprintln!(
        "{} lines: {} values, {} messages, {} dropped",
        stats.lines, stats.values, stats.messages, stats.dropped
    );
    Ok(())
}
