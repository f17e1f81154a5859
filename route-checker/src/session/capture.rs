//! Raw command capture and the shaping applied to it.

use memchr::memrchr;
use regex::bytes::Regex;

use crate::timestamp::CaptureTimestamp;

/// The text a device returned for one command.
///
/// Immutable once captured. Terminal controls, the echoed command and the
/// trailing prompt are removed; every other byte is as the device sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    command: String,
    text: String,
    captured_at: CaptureTimestamp,
}

impl RawCapture {
    /// Create a capture.
    pub fn new(
        command: impl Into<String>,
        text: impl Into<String>,
        captured_at: CaptureTimestamp,
    ) -> Self {
        Self {
            command: command.into(),
            text: text.into(),
            captured_at,
        }
    }

    /// The command that produced this output.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The captured text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the command was issued.
    pub fn captured_at(&self) -> CaptureTimestamp {
        self.captured_at
    }

    /// Whether the device returned nothing.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Drop the command echo and the trailing prompt line from `output`.
pub(crate) fn shape_output(output: &str, command: &str, prompt: &Regex) -> String {
    let mut text = output;

    // Echo: first line ends with the command (possibly behind a prompt)
    let first_end = text.find('\n').unwrap_or(text.len());
    if text[..first_end].trim_end().ends_with(command.trim()) {
        text = text.get(first_end + 1..).unwrap_or("");
    }

    // Trailing prompt: last non-blank line matches the prompt pattern
    let body = text.trim_end_matches(['\n', ' ', '\t']);
    let last_start = memrchr(b'\n', body.as_bytes()).map_or(0, |i| i + 1);
    if prompt.is_match(body[last_start..].as_bytes()) {
        text = &body[..last_start];
    }

    text.trim_end_matches('\n').to_string()
}
