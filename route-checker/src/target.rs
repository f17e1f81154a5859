//! Target device and credential resolution.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::TargetError;
use crate::platform::DeviceKind;

/// Environment variable holding the default target host.
pub const ENV_TARGET: &str = "NTA_TARGET";
/// Environment variable holding the username.
pub const ENV_USERNAME: &str = "NTA_USERNAME";
/// Environment variable holding the password.
pub const ENV_PASSWORD: &str = "NTA_PASSWORD";

/// Default connection timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7);

/// A device to capture from, with its credentials.
///
/// The password is only reachable through [`Target::password`]; `Debug` and
/// `Display` both redact it.
pub struct Target {
    /// Hostname or IP address.
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Login username.
    pub username: String,

    /// Login password.
    password: SecretString,

    /// Transport timeout.
    pub timeout: Duration,

    /// Command dialect of the device.
    pub device_kind: DeviceKind,
}

impl Target {
    /// Create a target on port 22 with the default timeout.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password: SecretString::from(password.into()),
            timeout: DEFAULT_TIMEOUT,
            device_kind: DeviceKind::default(),
        }
    }

    /// Set the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The login password.
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Check that host and credentials are present.
    pub fn validate(&self) -> Result<(), TargetError> {
        if self.host.trim().is_empty() {
            return Err(TargetError::Missing {
                field: "target host",
                env: ENV_TARGET,
            });
        }
        if self.username.is_empty() {
            return Err(TargetError::Missing {
                field: "username",
                env: ENV_USERNAME,
            });
        }
        if self.password.expose_secret().is_empty() {
            return Err(TargetError::Missing {
                field: "password",
                env: ENV_PASSWORD,
            });
        }
        Ok(())
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("device_kind", &self.device_kind)
            .finish()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:password_REDACTED@{}", self.username, self.host)
    }
}

/// Combines the configured default target with an explicit override.
pub struct TargetResolver {
    default_host: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    port: u16,
    timeout: Duration,
    device_kind: DeviceKind,
}

impl TargetResolver {
    /// Create a resolver from the configured values.
    pub fn new(
        default_host: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            default_host,
            username,
            password: password.map(SecretString::from),
            port: 22,
            timeout: DEFAULT_TIMEOUT,
            device_kind: DeviceKind::default(),
        }
    }

    /// Set the SSH port for resolved targets.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the transport timeout for resolved targets.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the device kind for resolved targets.
    pub fn device_kind(mut self, kind: DeviceKind) -> Self {
        self.device_kind = kind;
        self
    }

    /// Resolve the target; `host_override` wins over the configured default.
    pub fn resolve(self, host_override: Option<&str>) -> Result<Target, TargetError> {
        let host = host_override
            .map(str::to_string)
            .or(self.default_host)
            .unwrap_or_default();

        let target = Target {
            host: host.trim().to_string(),
            port: self.port,
            username: self.username.unwrap_or_default(),
            password: self
                .password
                .unwrap_or_else(|| SecretString::from(String::new())),
            timeout: self.timeout,
            device_kind: self.device_kind,
        };

        target.validate()?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_default() {
        let resolver = TargetResolver::new(
            Some("default.example.com".to_string()),
            Some("admin".to_string()),
            Some("hunter2".to_string()),
        );
        let target = resolver.resolve(Some("edge1.example.com")).unwrap();
        assert_eq!(target.host, "edge1.example.com");
        assert_eq!(target.username, "admin");
        assert_eq!(target.password().expose_secret(), "hunter2");
    }

    #[test]
    fn test_default_used_without_override() {
        let resolver = TargetResolver::new(
            Some("default.example.com".to_string()),
            Some("admin".to_string()),
            Some("hunter2".to_string()),
        )
        .port(2222)
        .timeout(Duration::from_secs(3));
        let target = resolver.resolve(None).unwrap();
        assert_eq!(target.host, "default.example.com");
        assert_eq!(target.port, 2222);
        assert_eq!(target.timeout, Duration::from_secs(3));
        assert_eq!(target.socket_addr(), "default.example.com:2222");
    }

    #[test]
    fn test_missing_values_are_reported() {
        let err = TargetResolver::new(None, Some("a".into()), Some("b".into()))
            .resolve(None)
            .unwrap_err();
        assert_eq!(
            err,
            TargetError::Missing {
                field: "target host",
                env: ENV_TARGET
            }
        );

        let err = TargetResolver::new(Some("r1".into()), None, Some("b".into()))
            .resolve(None)
            .unwrap_err();
        assert!(matches!(err, TargetError::Missing { field: "username", .. }));

        let err = TargetResolver::new(Some("r1".into()), Some("a".into()), Some(String::new()))
            .resolve(None)
            .unwrap_err();
        assert!(matches!(err, TargetError::Missing { field: "password", .. }));
    }

    #[test]
    fn test_password_is_redacted() {
        let target = Target::new("r1", "admin", "s3cr3t-value");
        assert_eq!(target.to_string(), "admin:password_REDACTED@r1");
        assert!(!format!("{target:?}").contains("s3cr3t-value"));
        assert!(!format!("{target:#?}").contains("s3cr3t-value"));
    }
}
