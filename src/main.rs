//! Debt Cleanser CLI
//!
//! Classifies the records of a tax-debt spreadsheet (CSV or Excel) and
//! prints a report.
//!
//! # Usage
//!
//! ```bash
//! debt-cleanser headers divida.csv
//! debt-cleanser headers divida.xlsx
//! debt-cleanser process divida.csv config.json [export_dir] [--json]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info` or `debug` to follow progress and per-row decisions

use debt_cleanser::{export, reader, report, CleanserError, Cleanser, CleansingConfig, Result};
use log::info;
use std::env;
use std::io;
use std::process;

const USAGE: &str = "Usage: debt-cleanser headers <input.csv|input.xlsx>\n       \
                     debt-cleanser process <input.csv|input.xlsx> <config.json> [export_dir] [--json]";

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let positional: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|a| *a != "--json")
        .collect();

    match positional.as_slice() {
        ["headers", input] => {
            for column in reader::read_headers(input)? {
                println!("{}", column);
            }
            Ok(())
        }
        ["process", input, config] => process_file(input, config, None, json),
        ["process", input, config, export_dir] => {
            process_file(input, config, Some(*export_dir), json)
        }
        _ => Err(CleanserError::Usage(USAGE.to_string())),
    }
}

fn process_file(input: &str, config: &str, export_dir: Option<&str>, json: bool) -> Result<()> {
    let config = CleansingConfig::from_path(config)?;
    let rows = reader::read_rows(input)?;

    let cleanser = Cleanser::new(config)?;
    let mut progress = |percent: u8, phase: &str| info!("{:>3}% {}", percent, phase);
    let outcome = cleanser.process_with_progress(&rows, &mut progress)?;
    let mapping = &cleanser.config().mapping;

    if let Some(dir) = export_dir {
        export::export_to_dir(&outcome.rows, mapping, dir)?;
    }

    let stdout = io::stdout();
    let handle = stdout.lock();
    if json {
        serde_json::to_writer_pretty(handle, &outcome)?;
        println!();
    } else {
        report::write_report(&outcome.summary, mapping, handle)?;
    }

    Ok(())
}
