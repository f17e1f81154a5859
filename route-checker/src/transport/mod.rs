//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management and the
//! two seams the session layer is written against: [`Connector`] opens a
//! shell, [`Shell`] moves bytes over it.

pub mod config;
mod ssh;

use std::future::Future;
use std::time::Duration;

pub use config::{HostKeyVerification, SshConfig};
pub use ssh::{SshConnector, SshShell};

use crate::error::TransportError;
use crate::platform::PlatformDefinition;
use crate::target::Target;

/// An interactive shell on a remote device.
pub trait Shell: Send {
    /// Send one line of input; a newline is appended.
    fn send(&mut self, input: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send raw input with no newline appended (pager keys).
    fn send_raw(&mut self, input: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait up to `wait` for the next chunk of output.
    ///
    /// Returns `Ok(None)` if nothing arrived in time.
    fn read_chunk(
        &mut self,
        wait: Duration,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Close the shell and the connection under it.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Opens shells to targets.
pub trait Connector: Send + Sync {
    /// The shell type this connector produces.
    type Shell: Shell;

    /// Connect, authenticate and start a PTY shell.
    ///
    /// A single attempt bounded by `target.timeout`; never retried.
    fn connect(
        &self,
        target: &Target,
        platform: &PlatformDefinition,
    ) -> impl Future<Output = Result<Self::Shell, TransportError>> + Send;
}
