//! Grammar for Cisco IOS `show ip route`.
//!
//! ```text
//! Codes: L - local, C - connected, S - static, R - RIP, M - mobile, B - BGP
//!        ...
//! Gateway of last resort is 10.0.0.1 to network 0.0.0.0
//!
//! S*    0.0.0.0/0 [1/0] via 10.0.0.1
//!       10.0.0.0/8 is variably subnetted, 2 subnets, 2 masks
//! C        10.0.0.0/24 is directly connected, GigabitEthernet0/0
//! L        10.0.0.2/32 is directly connected, GigabitEthernet0/0
//! O     192.168.1.0/24 [110/2] via 10.0.0.1, 00:01:23, GigabitEthernet0/0
//!                      [110/2] via 10.0.0.5, 00:01:23, GigabitEthernet0/1
//! O E2     172.16.100.0/24
//!            [110/20] via 10.0.0.1, 00:00:10, GigabitEthernet0/0
//! O*E2  0.0.0.0/0 [110/1] via 10.0.0.1, 00:00:10, GigabitEthernet0/0
//! ```
//!
//! The sub-type follows the code after a space, or directly after the
//! candidate-default star. Any other line that starts with a letter and
//! carries a dotted quad is treated as a route that failed to parse.
//!
//! Indented `[AD/metric] via` lines are further equal-cost paths of the entry
//! above and become entries of their own. A route line with nothing after the
//! prefix is wrapped; its attributes are on the next line.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::entry::{ParseReport, RoutingEntry, SkippedLine};
use crate::error::NormalizeError;

static ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<code>[A-Za-z])(?:(?P<flags>[*+%]+)\s*|\s+)(?:(?P<kind>IA|N1|N2|E1|E2|EX|L1|L2|ia|su)\s+)?(?P<network>\d{1,3}(?:\.\d{1,3}){3})(?:/(?P<len>\d{1,2}))?(?P<rest>.*)$",
    )
    .unwrap()
});

static ATTRIBUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:is directly connected|is a summary|(?:\[(?P<ad>\d+)/(?P<metric>\d+)\]\s+)?via\s+(?P<nh>\d{1,3}(?:\.\d{1,3}){3}))(?P<tail>(?:,\s*[^,]*)*)$",
    )
    .unwrap()
});

static SUBNET_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s+(?P<network>\d{1,3}(?:\.\d{1,3}){3})(?:/(?P<len>\d{1,2}))?\s+is\s+(?P<variably>variably\s+)?subnetted",
    )
    .unwrap()
});

static LEGEND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S{1,2} - \S").unwrap());

static PAGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^-*\s*--\s?more\s?--").unwrap());

static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.\-@/:()]{1,63}[>#]\s*$").unwrap());

static ROUTE_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z].*\b\d{1,3}(?:\.\d{1,3}){3}\b|\s.*\bvia\s+\S)").unwrap()
});

/// Prefix length supplied by a classful `is subnetted` header.
#[derive(Debug, Clone, Copy)]
struct Classful {
    major: u32,
    mask: u32,
    len: u8,
}

impl Classful {
    fn for_header(network: Ipv4Addr, len: u8) -> Self {
        let bits = u32::from(network);
        let mask = classful_mask(network);
        Self {
            major: bits & mask,
            mask,
            len,
        }
    }

    fn covers(&self, network: Ipv4Addr) -> bool {
        u32::from(network) & self.mask == self.major
    }
}

fn classful_mask(network: Ipv4Addr) -> u32 {
    match network.octets()[0] {
        0..=127 => 0xff00_0000,
        128..=191 => 0xffff_0000,
        _ => 0xffff_ff00,
    }
}

/// Line-level parser state.
struct Parser {
    strict: bool,
    report: ParseReport,
    classful: Option<Classful>,
    /// A route line whose attributes are on the next line.
    wrapped: Option<(usize, String, RoutingEntry)>,
}

pub(crate) fn parse(raw: &str, strict: bool) -> Result<ParseReport, NormalizeError> {
    let mut parser = Parser {
        strict,
        report: ParseReport::default(),
        classful: None,
        wrapped: None,
    };

    for (index, line) in raw.lines().enumerate() {
        parser.line(index + 1, line.trim_end())?;
    }
    parser.finish()?;

    Ok(parser.report)
}

impl Parser {
    fn line(&mut self, number: usize, line: &str) -> Result<(), NormalizeError> {
        let trimmed = line.trim_start();

        if let Some((start, text, entry)) = self.wrapped.take() {
            if line.starts_with(char::is_whitespace) {
                if let Some(caps) = ATTRIBUTES.captures(trimmed) {
                    return match apply_attributes(entry, &caps) {
                        Some(entry) => {
                            self.report.entries.push(entry);
                            Ok(())
                        }
                        None => self.reject(malformed(start, &text)),
                    };
                }
            }
            self.reject(NormalizeError::Malformed { line: start, text })?;
        }

        if trimmed.is_empty() || is_noise(line, trimmed) {
            return Ok(());
        }

        if trimmed.starts_with('%') && !LEGEND.is_match(trimmed) {
            return Err(NormalizeError::DeviceError {
                line: number,
                text: trimmed.to_string(),
            });
        }

        if let Some(caps) = SUBNET_HEADER.captures(line) {
            self.classful = header_context(&caps);
            return Ok(());
        }

        if let Some(caps) = ROUTE.captures(line) {
            return match self.route(&caps) {
                Some(Route::Complete(entry)) => {
                    self.report.entries.push(entry);
                    Ok(())
                }
                Some(Route::Wrapped(entry)) => {
                    self.wrapped = Some((number, line.to_string(), entry));
                    Ok(())
                }
                None => self.reject(malformed(number, line)),
            };
        }

        if line.starts_with(char::is_whitespace) {
            if let Some(caps) = ATTRIBUTES.captures(trimmed) {
                let Some(previous) = self.report.entries.last().cloned() else {
                    return self.reject(NormalizeError::OrphanContinuation {
                        line: number,
                        text: line.to_string(),
                    });
                };
                let path = RoutingEntry {
                    distance: None,
                    metric: None,
                    next_hop: None,
                    interface: None,
                    uptime: None,
                    ..previous
                };
                return match apply_attributes(path, &caps) {
                    Some(entry) => {
                        self.report.entries.push(entry);
                        Ok(())
                    }
                    None => self.reject(malformed(number, line)),
                };
            }
        }

        if ROUTE_SHAPED.is_match(line) {
            return self.reject(malformed(number, line));
        }

        Ok(())
    }

    fn route(&self, caps: &Captures<'_>) -> Option<Route> {
        let network: Ipv4Addr = caps["network"].parse().ok()?;
        let prefix_length = match caps.name("len") {
            Some(len) => Some(len.as_str().parse::<u8>().ok().filter(|l| *l <= 32)?),
            None => self
                .classful
                .filter(|c| c.covers(network))
                .map(|c| c.len),
        };

        let mut entry = RoutingEntry::new(&caps["code"], network);
        entry.route_type = caps.name("kind").map(|k| k.as_str().to_string());
        entry.candidate_default = caps.name("flags").is_some_and(|f| f.as_str().contains('*'));
        entry.prefix_length = prefix_length;

        let rest = caps["rest"].trim();
        if rest.is_empty() {
            return Some(Route::Wrapped(entry));
        }
        let attributes = ATTRIBUTES.captures(rest)?;
        apply_attributes(entry, &attributes).map(Route::Complete)
    }

    /// Fail in strict mode, record the line in lenient mode.
    fn reject(&mut self, error: NormalizeError) -> Result<(), NormalizeError> {
        if self.strict {
            return Err(error);
        }
        match error {
            NormalizeError::Malformed { line, text }
            | NormalizeError::OrphanContinuation { line, text } => {
                self.report.skipped.push(SkippedLine { line, text });
                Ok(())
            }
            other => Err(other),
        }
    }

    fn finish(&mut self) -> Result<(), NormalizeError> {
        match self.wrapped.take() {
            Some((line, text, _)) => self.reject(NormalizeError::Malformed { line, text }),
            None => Ok(()),
        }
    }
}

enum Route {
    Complete(RoutingEntry),
    Wrapped(RoutingEntry),
}

fn is_noise(line: &str, trimmed: &str) -> bool {
    trimmed.starts_with("Codes:")
        || trimmed.starts_with("Gateway of last resort")
        || trimmed.starts_with("Default gateway is")
        || trimmed.starts_with("Routing Table:")
        || (line.starts_with(char::is_whitespace) && LEGEND.is_match(trimmed))
        || PAGER.is_match(trimmed)
        || PROMPT.is_match(trimmed)
}

fn header_context(caps: &Captures<'_>) -> Option<Classful> {
    if caps.name("variably").is_some() {
        return None;
    }
    let network: Ipv4Addr = caps["network"].parse().ok()?;
    let len: u8 = caps.name("len")?.as_str().parse().ok()?;
    (len <= 32).then(|| Classful::for_header(network, len))
}

/// Fill distance, metric, next hop, uptime and interface from an
/// attribute match. Returns `None` if a value does not fit its type or the
/// trailing fields are ambiguous.
fn apply_attributes(mut entry: RoutingEntry, caps: &Captures<'_>) -> Option<RoutingEntry> {
    if let Some(ad) = caps.name("ad") {
        entry.distance = Some(ad.as_str().parse().ok()?);
    }
    if let Some(metric) = caps.name("metric") {
        entry.metric = Some(metric.as_str().parse().ok()?);
    }
    if let Some(nh) = caps.name("nh") {
        entry.next_hop = Some(nh.as_str().parse().ok()?);
    }

    let tail = caps.name("tail").map_or("", |t| t.as_str());
    for token in tail.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let slot = if token.starts_with(|c: char| c.is_ascii_digit()) {
            &mut entry.uptime
        } else {
            &mut entry.interface
        };
        if slot.is_some() {
            return None;
        }
        *slot = Some(token.to_string());
    }

    Some(entry)
}

fn malformed(line: usize, text: &str) -> NormalizeError {
    NormalizeError::Malformed {
        line,
        text: text.to_string(),
    }
}
