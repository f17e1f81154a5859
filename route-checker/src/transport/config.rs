//! SSH connection configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::target::Target;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

impl FromStr for HostKeyVerification {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" | "yes" => Ok(Self::Strict),
            "accept-new" | "accept_new" => Ok(Self::AcceptNew),
            "off" | "no" | "disabled" => Ok(Self::Disabled),
            other => Err(ConfigError::InvalidValue {
                option: "host-key-checking",
                message: format!("'{other}' is not one of strict, accept-new, off"),
            }),
        }
    }
}

impl fmt::Display for HostKeyVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::AcceptNew => "accept-new",
            Self::Disabled => "off",
        })
    }
}

/// Connection settings that are not part of the target itself.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file (`~/.ssh/known_hosts` when `None`).
    pub known_hosts_path: Option<PathBuf>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Keepalive-based inactivity limit for the SSH session.
    pub inactivity_timeout: Duration,
}

impl SshConfig {
    /// Set the host key verification mode.
    pub fn with_host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Set the known_hosts file.
    pub fn with_known_hosts(mut self, path: Option<PathBuf>) -> Self {
        self.known_hosts_path = path;
        self
    }

    /// Inactivity limit to use for a given target: never shorter than the
    /// configured value, and never shorter than the connect timeout.
    pub fn inactivity_for(&self, target: &Target) -> Duration {
        self.inactivity_timeout.max(target.timeout)
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            terminal_width: 511,
            terminal_height: 24,
            inactivity_timeout: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_verification_from_str() {
        assert_eq!("strict".parse::<HostKeyVerification>().unwrap(), HostKeyVerification::Strict);
        assert_eq!(
            "accept-new".parse::<HostKeyVerification>().unwrap(),
            HostKeyVerification::AcceptNew
        );
        assert_eq!("OFF".parse::<HostKeyVerification>().unwrap(), HostKeyVerification::Disabled);
        assert!("maybe".parse::<HostKeyVerification>().is_err());
    }

    #[test]
    fn test_inactivity_never_below_connect_timeout() {
        let config = SshConfig {
            inactivity_timeout: Duration::from_secs(5),
            ..SshConfig::default()
        };
        let target = Target::new("r1", "u", "p").with_timeout(Duration::from_secs(30));
        assert_eq!(config.inactivity_for(&target), Duration::from_secs(30));
    }
}
