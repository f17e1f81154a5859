//! Command-line arguments and environment configuration.
//!
//! Values come from flags first, then from the environment. The environment
//! may be pre-seeded from an env file (`route-checker.env` by default);
//! variables already set in the process win over the file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser};
use log::debug;

use crate::error::ConfigError;
use crate::platform::DeviceKind;
use crate::session::SessionOptions;
use crate::target::{DEFAULT_TIMEOUT, ENV_PASSWORD, ENV_TARGET, ENV_USERNAME, TargetResolver};
use crate::transport::{HostKeyVerification, SshConfig};

/// Default env file, looked up in the current directory.
pub const DEFAULT_ENV_FILE: &str = "route-checker.env";

/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "route-checker.log";

/// Snapshot the routing table of a network device.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "route-checker")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Connect to the target and capture its routing table.
    #[arg(long, alias = "fetch_data")]
    pub fetch_data: bool,

    /// Device to capture from; overrides NTA_TARGET.
    #[arg(short, long, env = ENV_TARGET)]
    pub target: Option<String>,

    /// Login username.
    #[arg(long, env = ENV_USERNAME)]
    pub username: Option<String>,

    /// SSH port.
    #[arg(long, env = "NTA_PORT", default_value_t = 22)]
    pub port: u16,

    /// Connection timeout in seconds.
    #[arg(long, env = "NTA_TIMEOUT", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Quiet period in milliseconds that marks the end of command output.
    #[arg(long, default_value_t = 2000)]
    pub settle: u64,

    /// Maximum time in seconds to read one command's output.
    #[arg(long, default_value_t = 120)]
    pub read_timeout: u64,

    /// Directory the capture files are written to.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Host key checking: strict, accept-new or off.
    #[arg(long, default_value = "accept-new")]
    pub host_key_checking: HostKeyVerification,

    /// known_hosts file (default ~/.ssh/known_hosts).
    #[arg(long)]
    pub known_hosts: Option<PathBuf>,

    /// Skip route lines that do not parse instead of failing.
    #[arg(long)]
    pub lenient: bool,

    /// Device dialect.
    #[arg(long, default_value = "cisco_ios", hide = true)]
    pub device_type: DeviceKind,

    /// Env file loaded before reading the environment.
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Log file (rotated at 5 MB).
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Debug output on the console.
    #[arg(short, long)]
    pub debug: bool,

    /// Resolve the configuration and exit without connecting.
    #[arg(long, hide = true)]
    pub test: bool,
}

impl Args {
    /// Parse `argv`, load the env file it names, then parse again so
    /// environment fallbacks see the file's values.
    pub fn parse_with_env_file<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T> + Clone,
        T: Into<OsString> + Clone,
    {
        let first = Self::try_parse_from(argv.clone())?;
        match load_env_file(&first.env_file) {
            Ok(true) => Self::try_parse_from(argv),
            Ok(false) => Ok(first),
            Err(e) => Err(Self::command().error(clap::error::ErrorKind::Io, e)),
        }
    }

    /// Whether there is anything to do.
    pub fn has_action(&self) -> bool {
        self.fetch_data || self.test
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                option: "port",
                message: "must be between 1 and 65535".to_string(),
            });
        }
        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                option: "timeout",
                message: "must be at least 1 second".to_string(),
            });
        }
        if self.settle == 0 {
            return Err(ConfigError::InvalidValue {
                option: "settle",
                message: "must be at least 1 millisecond".to_string(),
            });
        }
        if Duration::from_secs(self.read_timeout) <= self.settle_duration() {
            return Err(ConfigError::InvalidValue {
                option: "read-timeout",
                message: format!(
                    "{}s must be longer than the settle time of {}ms",
                    self.read_timeout, self.settle
                ),
            });
        }
        Ok(())
    }

    fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.settle)
    }

    /// Resolver over the configured target and credentials.
    ///
    /// The password is read from the environment only.
    pub fn resolver(&self) -> TargetResolver {
        let default_host = std::env::var(ENV_TARGET).ok();
        let password = std::env::var(ENV_PASSWORD).ok();
        TargetResolver::new(default_host, self.username.clone(), password)
            .port(self.port)
            .timeout(Duration::from_secs(self.timeout))
            .device_kind(self.device_type)
    }

    /// Read settings for the session.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            settle: self.settle_duration(),
            read_timeout: Duration::from_secs(self.read_timeout),
            ..SessionOptions::default()
        }
    }

    /// Transport settings.
    pub fn ssh_config(&self) -> SshConfig {
        SshConfig::default()
            .with_host_key_verification(self.host_key_checking)
            .with_known_hosts(self.known_hosts.clone())
    }

    /// Render the help text.
    pub fn help() -> String {
        Self::command().render_help().to_string()
    }
}

/// Load `path` into the process environment if it exists.
///
/// Returns whether a file was loaded. Variables already set are kept.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!("loaded environment from {}", path.display());
    Ok(true)
}
