//! Structured routing table records.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// One routing table entry, in the order the device listed it.
///
/// Every field the device may omit is optional; absent values serialize as
/// `null` so each record has the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingEntry {
    /// Protocol code as printed by the device (`S`, `C`, `O`, ...).
    pub protocol: String,

    /// Route sub-type (`IA`, `E2`, `L1`, ...).
    #[serde(rename = "type")]
    pub route_type: Option<String>,

    /// Marked as candidate default (`*`).
    pub candidate_default: bool,

    pub network: Ipv4Addr,

    pub prefix_length: Option<u8>,

    /// Administrative distance.
    pub distance: Option<u32>,

    pub metric: Option<u32>,

    pub next_hop: Option<Ipv4Addr>,

    /// Outgoing interface.
    pub interface: Option<String>,

    /// Route age as printed (`00:01:23`, `2w3d`).
    pub uptime: Option<String>,
}

impl RoutingEntry {
    /// Create an entry with only protocol and network set.
    pub fn new(protocol: impl Into<String>, network: Ipv4Addr) -> Self {
        Self {
            protocol: protocol.into(),
            route_type: None,
            candidate_default: false,
            network,
            prefix_length: None,
            distance: None,
            metric: None,
            next_hop: None,
            interface: None,
            uptime: None,
        }
    }

    /// `network/len`, or the bare network when the length is unknown.
    pub fn prefix(&self) -> String {
        match self.prefix_length {
            Some(len) => format!("{}/{}", self.network, len),
            None => self.network.to_string(),
        }
    }
}

/// Result of a lenient parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Entries that fit the grammar.
    pub entries: Vec<RoutingEntry>,

    /// Route-shaped lines that did not fit and were passed over.
    pub skipped: Vec<SkippedLine>,
}

/// A line the lenient parser passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the raw text.
    pub line: usize,
    pub text: String,
}
