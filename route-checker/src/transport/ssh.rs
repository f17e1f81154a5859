//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::config::{HostKeyVerification, SshConfig};
use super::{Connector, Shell};
use crate::error::TransportError;
use crate::platform::PlatformDefinition;
use crate::target::Target;

/// Connector producing russh-backed shells.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    config: SshConfig,
}

impl SshConnector {
    /// Create a connector with the given settings.
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Authenticate with the server.
    async fn authenticate(
        session: &mut Handle<SshHandler>,
        target: &Target,
    ) -> Result<(), TransportError> {
        let success = session
            .authenticate_password(
                target.username.as_str(),
                target.password().expose_secret(),
            )
            .await
            .map_err(TransportError::Ssh)?
            .success();

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: target.username.clone(),
            });
        }

        Ok(())
    }

    /// Open a PTY channel with a shell on an authenticated session.
    async fn open_channel(
        &self,
        session: &Handle<SshHandler>,
        platform: &PlatformDefinition,
    ) -> Result<Channel<Msg>, TransportError> {
        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "xterm",
                platform.terminal_width.max(self.config.terminal_width),
                platform.terminal_height.max(self.config.terminal_height),
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }
}

impl Connector for SshConnector {
    type Shell = SshShell;

    async fn connect(
        &self,
        target: &Target,
        platform: &PlatformDefinition,
    ) -> Result<SshShell, TransportError> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(self.config.inactivity_for(target)),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: target.host.clone(),
            port: target.port,
            host_key_verification: self.config.host_key_verification,
            known_hosts_path: self.config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("opening SSH transport to {}", target.socket_addr());

        let establish = async {
            let mut session = client::connect(ssh_config, (target.host.as_str(), target.port), handler)
                .await
                .map_err(|e| {
                    // Prefer the detailed host key error over russh's generic one
                    let host_key = host_key_error.lock().ok().and_then(|mut slot| slot.take());
                    host_key.unwrap_or_else(|| match e {
                        russh::Error::IO(source) => TransportError::ConnectionFailed {
                            host: target.host.clone(),
                            port: target.port,
                            source,
                        },
                        other => TransportError::Ssh(other),
                    })
                })?;
            Self::authenticate(&mut session, target).await?;
            let channel = self.open_channel(&session, platform).await?;
            Ok::<_, TransportError>(SshShell {
                session,
                channel,
                closed: false,
            })
        };

        tokio::time::timeout(target.timeout, establish)
            .await
            .map_err(|_| TransportError::Timeout(target.timeout))?
    }
}

/// A PTY shell over an authenticated russh session.
pub struct SshShell {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// The interactive channel.
    channel: Channel<Msg>,

    /// Whether `close` already ran.
    closed: bool,
}

impl Shell for SshShell {
    async fn send(&mut self, input: &str) -> Result<(), TransportError> {
        let line = format!("{input}\n");
        self.send_raw(&line).await
    }

    async fn send_raw(&mut self, input: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        self.channel
            .data(input.as_bytes())
            .await
            .map_err(TransportError::Ssh)
    }

    async fn read_chunk(&mut self, wait: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }

        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let msg = match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Err(_) => return Ok(None),
                Ok(msg) => msg,
            };

            match msg {
                Some(ChannelMsg::Data { data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExtendedData { data, .. }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(TransportError::Disconnected);
                }
                Some(other) => trace!("ignoring channel message {other:?}"),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Err(e) = self.channel.eof().await {
            debug!("channel eof failed: {e}");
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    /// Record a rejection reason for connect() to report.
    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}
