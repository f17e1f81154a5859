//! Platform definitions for supported device dialects.
//!
//! A platform bundles the prompt and pager patterns, failure markers and
//! session preparation commands for one kind of device.

mod definition;
mod registry;
pub mod vendors;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use definition::PlatformDefinition;
pub use registry::PlatformRegistry;

use crate::error::TargetError;

/// Device dialect, selecting both the session behaviour and the output grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Cisco IOS / IOS XE classic CLI.
    #[default]
    CiscoIos,
}

impl DeviceKind {
    /// Every supported kind.
    pub const ALL: &'static [DeviceKind] = &[DeviceKind::CiscoIos];

    /// The canonical platform name (`cisco_ios`).
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::CiscoIos => "cisco_ios",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cisco_ios" | "cisco_xe" | "cisco_iosxe" => Ok(DeviceKind::CiscoIos),
            _ => Err(TargetError::UnsupportedDeviceKind {
                name: s.to_string(),
            }),
        }
    }
}
