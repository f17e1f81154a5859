//! Error types for route-checker.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for route-checker operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Could not reach or authenticate to the device.
    #[error("Connection error: {0}")]
    Connection(#[from] TransportError),

    /// Session negotiation or command execution errors.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Raw output did not fit the selected grammar.
    #[error("Unparsable output: {0}")]
    Normalize(#[from] NormalizeError),

    /// Artifact files could not be written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Target resolution errors.
    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host is not present in known_hosts and verification is strict
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key does not match the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Session layer errors (negotiation and command capture).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session preparation failed
    #[error("Negotiation failed: {message}")]
    Negotiation { message: String },

    /// No quiet period was observed before the read deadline
    #[error("Command '{command}' timed out after {timeout:?} ({received} bytes received)")]
    CommandTimeout {
        command: String,
        timeout: Duration,
        received: usize,
    },

    /// `run_command` was called before `prepare`
    #[error("Session not prepared - call prepare() first")]
    NotPrepared,

    /// The session is already prepared
    #[error("Session already prepared")]
    AlreadyPrepared,

    /// The session was closed
    #[error("Session closed")]
    Closed,

    /// Transport failure while the session was live
    #[error("Transport failure during session: {0}")]
    Transport(#[from] TransportError),
}

/// Output normalizer errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    /// No grammar is registered for the platform/command pair
    #[error("No grammar for command '{command}' on platform '{platform}'")]
    NoGrammar { platform: String, command: String },

    /// A line looked like a route but did not fit the grammar
    #[error("Line {line}: unrecognised route entry '{text}'")]
    Malformed { line: usize, text: String },

    /// A path continuation appeared with no route before it
    #[error("Line {line}: continuation without a preceding route '{text}'")]
    OrphanContinuation { line: usize, text: String },

    /// The device rejected the command
    #[error("Line {line}: device reported '{text}'")]
    DeviceError { line: usize, text: String },
}

/// Artifact storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A file with the artifact's name already exists
    #[error("Refusing to overwrite existing file {}", path.display())]
    Collision { path: PathBuf },

    /// Writing the file failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a structured artifact back failed
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Structured encoding failed
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Target resolution errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TargetError {
    /// A required value was missing or empty
    #[error("Missing {field} (set {env} or pass it on the command line)")]
    Missing { field: &'static str, env: &'static str },

    /// The device kind is not supported
    #[error("Unsupported device kind '{name}'")]
    UnsupportedDeviceKind { name: String },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The env file exists but could not be loaded
    #[error("Failed to load {}: {message}", path.display())]
    EnvFile { path: PathBuf, message: String },

    /// An option value is out of range
    #[error("Invalid {option}: {message}")]
    InvalidValue { option: &'static str, message: String },

    /// The log file could not be opened
    #[error("Failed to open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A logger was already installed
    #[error("Logger already initialised")]
    LoggerInstalled,
}

/// Result type alias using route-checker's Error.
pub type Result<T> = std::result::Result<T, Error>;
