//! Re-parse a raw capture file
//!
//! Reads a `.log` file written by a previous run and prints the parsed
//! routing entries as JSON. Useful after a failed parse: the raw file is
//! always written first, so it can be inspected and re-parsed offline.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example reparse_capture -- 10.1.1.1-20240404-052348.log
//! cargo run --example reparse_capture -- 10.1.1.1-20240404-052348.log --lenient
//! ```

use std::env;
use std::fs;
use std::process::ExitCode;

use route_checker::run::DEFAULT_COMMAND;
use route_checker::{DeviceKind, parse, parse_report};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("usage: reparse_capture <capture.log> [--lenient]");
        return ExitCode::from(1);
    };
    let lenient = args.iter().any(|a| a == "--lenient");

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("cannot read {path}: {e}");
            return ExitCode::from(1);
        }
    };

    let entries = if lenient {
        match parse_report(&raw, DeviceKind::CiscoIos, DEFAULT_COMMAND) {
            Ok(report) => {
                for skipped in &report.skipped {
                    eprintln!("skipped line {}: {}", skipped.line, skipped.text);
                }
                report.entries
            }
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(5);
            }
        }
    } else {
        match parse(&raw, DeviceKind::CiscoIos, DEFAULT_COMMAND) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(5);
            }
        }
    };

    match serde_json::to_string_pretty(&entries) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(6)
        }
    }
}
