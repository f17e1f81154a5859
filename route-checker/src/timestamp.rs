//! Capture timestamps shared by both artifacts of a run.

use std::fmt;

use chrono::{DateTime, Utc};

/// Filename-safe timestamp format, second resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// The UTC instant a capture was taken.
///
/// Recorded once per run and copied into both artifact names, so the raw
/// and structured files of a run always carry the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureTimestamp(DateTime<Utc>);

impl CaptureTimestamp {
    /// The current instant.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing instant.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// The filename token, e.g. `20240404-052348`.
    pub fn token(&self) -> String {
        self.0.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}
