//! Output normalization: raw command text to structured routing entries.
//!
//! Parsing is a pure function of the raw text, the device kind and the
//! command. The grammar is chosen from the `(device kind, command)` pair;
//! commands are matched the way the CLI accepts them, so `sh ip ro` selects
//! the same grammar as `show ip route`.

mod cisco_ios;
mod entry;

use std::sync::LazyLock;

use regex::Regex;

pub use entry::{ParseReport, RoutingEntry, SkippedLine};

use crate::error::NormalizeError;
use crate::platform::DeviceKind;

static SHOW_IP_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^sh(?:o(?:w)?)?\s+ip\s+ro(?:u(?:t(?:e)?)?)?$").unwrap()
});

/// A parser for one command's output on one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Cisco IOS `show ip route`.
    CiscoIosRoutes,
}

impl Grammar {
    /// Select the grammar for `command` on `kind`.
    pub fn select(kind: DeviceKind, command: &str) -> Result<Self, NormalizeError> {
        let normalized = command.split_whitespace().collect::<Vec<_>>().join(" ");

        match kind {
            DeviceKind::CiscoIos if SHOW_IP_ROUTE.is_match(&normalized) => {
                Ok(Grammar::CiscoIosRoutes)
            }
            _ => Err(NormalizeError::NoGrammar {
                platform: kind.to_string(),
                command: command.to_string(),
            }),
        }
    }

    fn run(self, raw: &str, strict: bool) -> Result<ParseReport, NormalizeError> {
        match self {
            Grammar::CiscoIosRoutes => cisco_ios::parse(raw, strict),
        }
    }
}

/// Parse `raw` strictly.
///
/// Any route-shaped line that does not fit the grammar is an error naming
/// its line number. Output without route lines parses to an empty list.
pub fn parse(
    raw: &str,
    kind: DeviceKind,
    command: &str,
) -> Result<Vec<RoutingEntry>, NormalizeError> {
    let report = Grammar::select(kind, command)?.run(raw, true)?;
    Ok(report.entries)
}

/// Parse `raw`, passing over route-shaped lines that do not fit.
///
/// Device error lines still fail the parse.
pub fn parse_report(
    raw: &str,
    kind: DeviceKind,
    command: &str,
) -> Result<ParseReport, NormalizeError> {
    Grammar::select(kind, command)?.run(raw, false)
}
