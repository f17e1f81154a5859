//! Session management for a single capture.
//!
//! A [`Session`] is one shell on one device, used for exactly one command.
//! It moves through `Connected → Prepared → Closed`; running a command
//! before preparation fails fast. [`SessionManager::capture`] wraps the
//! whole lifecycle so the session is closed on every exit path.

mod capture;
mod wait;

use std::time::Duration;

use log::{debug, info, warn};
use regex::bytes::Regex;

pub use capture::RawCapture;

use crate::channel::{PatternBuffer, compile_prompt_pattern};
use crate::error::{Result, SessionError, TargetError};
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::run::{RunFailure, RunStage, RunTracker};
use crate::target::Target;
use crate::timestamp::CaptureTimestamp;
use crate::transport::{Connector, Shell};

use self::wait::SettleWindow;

/// Default quiet period that marks the end of command output.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(2);

/// Default hard limit for reading one command's output.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Tunables for session reads.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Quiet period that ends a command read.
    pub settle: Duration,

    /// Hard limit on a command read.
    pub read_timeout: Duration,

    /// Bytes from the end of the buffer searched for prompts and pagers.
    pub search_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            search_depth: 1000,
        }
    }
}

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport is up; negotiation has not run.
    Connected,
    /// Negotiation done; one command may be run.
    Prepared,
    /// Closed; no further I/O.
    Closed,
}

/// A live shell on one device.
pub struct Session<S: Shell> {
    shell: S,
    platform: PlatformDefinition,
    host: String,
    options: SessionOptions,
    prompt_timeout: Duration,
    buffer: PatternBuffer,
    state: SessionState,
    /// Exact prompt learned during negotiation.
    base_prompt: Option<String>,
    prompt: Regex,
}

impl<S: Shell> Session<S> {
    /// Connect to `target` through `connector`.
    ///
    /// The password is handed to the connector and never logged.
    pub async fn open<C>(
        connector: &C,
        target: &Target,
        platform: PlatformDefinition,
        options: SessionOptions,
    ) -> Result<Self>
    where
        C: Connector<Shell = S>,
    {
        target.validate()?;

        debug!("Connecting to {target}");
        let shell = connector.connect(target, &platform).await?;
        info!("Connected to {}", target.host);

        Ok(Self {
            shell,
            prompt: platform.prompt_pattern.clone(),
            platform,
            host: target.host.clone(),
            buffer: PatternBuffer::new(options.search_depth),
            options,
            prompt_timeout: target.timeout,
            state: SessionState::Connected,
            base_prompt: None,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The prompt learned during negotiation.
    pub fn base_prompt(&self) -> Option<&str> {
        self.base_prompt.as_deref()
    }

    /// Prepare the session: find the prompt, then run the platform's
    /// on-open commands (pagination off, wide terminal).
    pub async fn prepare(&mut self) -> std::result::Result<(), SessionError> {
        match self.state {
            SessionState::Connected => {}
            SessionState::Prepared => return Err(SessionError::AlreadyPrepared),
            SessionState::Closed => return Err(SessionError::Closed),
        }

        self.shell.send("").await?;
        let found = wait::read_until_prompt(
            &mut self.shell,
            &mut self.buffer,
            &self.platform.prompt_pattern,
            self.prompt_timeout,
        )
        .await?;
        if !found {
            return Err(SessionError::Negotiation {
                message: format!("no prompt within {:?}", self.prompt_timeout),
            });
        }

        let base_prompt = self
            .buffer
            .search_tail(&self.platform.prompt_pattern)
            .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string())
            .unwrap_or_default();
        self.prompt = compile_prompt_pattern(&regex::escape(&base_prompt)).map_err(|e| {
            SessionError::Negotiation {
                message: format!("unusable prompt '{base_prompt}': {e}"),
            }
        })?;
        debug!("base prompt is {base_prompt:?}");
        self.base_prompt = Some(base_prompt);
        self.buffer.clear();

        for command in self.platform.on_open_commands.clone() {
            self.shell.send(&command).await?;
            let found = wait::read_until_prompt(
                &mut self.shell,
                &mut self.buffer,
                &self.prompt,
                self.prompt_timeout,
            )
            .await?;
            let reply = String::from_utf8_lossy(&self.buffer.take()).to_string();

            if !found {
                return Err(SessionError::Negotiation {
                    message: format!("'{command}' got no prompt within {:?}", self.prompt_timeout),
                });
            }
            if let Some(marker) = self.platform.detect_failure(&reply) {
                return Err(SessionError::Negotiation {
                    message: format!("'{command}' rejected: {marker}"),
                });
            }
        }

        self.state = SessionState::Prepared;
        debug!("session preparation executed on {}", self.host);
        Ok(())
    }

    /// Run `command` and return everything the device printed.
    ///
    /// End of output is detected by a settle period, so output of any
    /// length is read in full; a read that never settles is an error rather
    /// than a truncated capture.
    pub async fn run_command(
        &mut self,
        command: &str,
    ) -> std::result::Result<RawCapture, SessionError> {
        match self.state {
            SessionState::Prepared => {}
            SessionState::Connected => return Err(SessionError::NotPrepared),
            SessionState::Closed => return Err(SessionError::Closed),
        }

        self.buffer.clear();
        let captured_at = CaptureTimestamp::now();
        debug!("Timestamp to use is {captured_at}");

        self.shell.send(command).await?;
        let window = SettleWindow {
            settle: self.options.settle,
            deadline: self.options.read_timeout,
        };
        let settled = wait::read_until_settled(
            &mut self.shell,
            &mut self.buffer,
            command,
            self.platform.pager_pattern.as_ref(),
            &self.platform.pager_advance,
            window,
        )
        .await?;

        if !settled {
            return Err(SessionError::CommandTimeout {
                command: command.to_string(),
                timeout: self.options.read_timeout,
                received: self.buffer.received(),
            });
        }

        let output = String::from_utf8_lossy(&self.buffer.take()).to_string();
        let text = capture::shape_output(&output, command, &self.prompt);

        if let Some(marker) = self.platform.detect_failure(&text) {
            warn!("{command} output on {} contains '{marker}'", self.host);
        }
        debug!("{command} executed and obtained the result ({} bytes)", text.len());

        Ok(RawCapture::new(command, text, captured_at))
    }

    /// Close the session. Idempotent; close errors are logged, not returned.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        match self.shell.close().await {
            Ok(()) => debug!("session to {} closed", self.host),
            Err(e) => warn!("error while closing session to {}: {e}", self.host),
        }
    }
}

impl<S: Shell> Drop for Session<S> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            warn!("session to {} dropped without close()", self.host);
        }
    }
}

/// Opens, prepares, uses and closes one session per capture.
pub struct SessionManager<C> {
    connector: C,
    options: SessionOptions,
}

impl<C: Connector> SessionManager<C> {
    /// Create a manager over `connector`.
    pub fn new(connector: C, options: SessionOptions) -> Self {
        Self { connector, options }
    }

    /// Run `command` on `target` inside a fresh session.
    ///
    /// Advances `tracker` through Connecting, Negotiating and Capturing.
    /// Whatever happens after the connection is up, the session is closed
    /// exactly once before this returns.
    pub async fn capture(
        &self,
        target: &Target,
        command: &str,
        tracker: &mut RunTracker,
    ) -> std::result::Result<RawCapture, RunFailure> {
        tracker.advance(RunStage::Connecting);

        let platform = match PlatformRegistry::global().get(target.device_kind) {
            Some(platform) => platform.clone(),
            None => {
                let error = TargetError::UnsupportedDeviceKind {
                    name: target.device_kind.to_string(),
                };
                return Err(tracker.fail(error.into()));
            }
        };

        let mut session =
            match Session::open(&self.connector, target, platform, self.options.clone()).await {
                Ok(session) => session,
                Err(e) => return Err(tracker.fail(e)),
            };

        let result = Self::prepare_and_run(&mut session, command, tracker).await;
        session.close().await;
        result
    }

    async fn prepare_and_run(
        session: &mut Session<C::Shell>,
        command: &str,
        tracker: &mut RunTracker,
    ) -> std::result::Result<RawCapture, RunFailure> {
        tracker.advance(RunStage::Negotiating);
        session
            .prepare()
            .await
            .map_err(|e| tracker.fail(e.into()))?;

        tracker.advance(RunStage::Capturing);
        session
            .run_command(command)
            .await
            .map_err(|e| tracker.fail(e.into()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted shell and connector for exercising sessions without a device.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::error::TransportError;
    use crate::platform::PlatformDefinition;
    use crate::target::Target;
    use crate::transport::{Connector, Shell};

    /// One scripted reaction of the fake device.
    #[derive(Debug, Clone)]
    pub enum Step {
        /// Deliver bytes on the next read.
        Data(Vec<u8>),
        /// Stay silent for one read.
        Silence,
        /// Fail the next read.
        Drop,
    }

    /// Everything the fake device observed.
    #[derive(Debug, Default)]
    pub struct Observed {
        pub sent: Vec<String>,
        pub closes: usize,
    }

    /// A shell that replays a script; once exhausted it stays silent.
    pub struct ScriptedShell {
        script: VecDeque<Step>,
        observed: Arc<Mutex<Observed>>,
    }

    impl Shell for ScriptedShell {
        async fn send(&mut self, input: &str) -> Result<(), TransportError> {
            self.observed.lock().unwrap().sent.push(format!("{input}\n"));
            Ok(())
        }

        async fn send_raw(&mut self, input: &str) -> Result<(), TransportError> {
            self.observed.lock().unwrap().sent.push(input.to_string());
            Ok(())
        }

        async fn read_chunk(&mut self, wait: Duration) -> Result<Option<Vec<u8>>, TransportError> {
            match self.script.pop_front() {
                Some(Step::Data(data)) => Ok(Some(data)),
                Some(Step::Silence) => Ok(None),
                Some(Step::Drop) => Err(TransportError::Disconnected),
                None => {
                    tokio::time::sleep(wait).await;
                    Ok(None)
                }
            }
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.observed.lock().unwrap().closes += 1;
            Ok(())
        }
    }

    /// Connector handing out one scripted shell, or a scripted failure.
    pub struct ScriptedConnector {
        script: Mutex<Option<Vec<Step>>>,
        pub observed: Arc<Mutex<Observed>>,
        fail_with: Mutex<Option<TransportError>>,
    }

    impl ScriptedConnector {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(Some(steps)),
                observed: Arc::new(Mutex::new(Observed::default())),
                fail_with: Mutex::new(None),
            }
        }

        pub fn failing(error: TransportError) -> Self {
            let connector = Self::new(vec![]);
            *connector.fail_with.lock().unwrap() = Some(error);
            connector
        }

        pub fn sent(&self) -> Vec<String> {
            self.observed.lock().unwrap().sent.clone()
        }

        pub fn closes(&self) -> usize {
            self.observed.lock().unwrap().closes
        }
    }

    impl Connector for ScriptedConnector {
        type Shell = ScriptedShell;

        async fn connect(
            &self,
            _target: &Target,
            _platform: &PlatformDefinition,
        ) -> Result<ScriptedShell, TransportError> {
            if let Some(error) = self.fail_with.lock().unwrap().take() {
                return Err(error);
            }
            let steps = self.script.lock().unwrap().take().unwrap_or_default();
            Ok(ScriptedShell {
                script: steps.into(),
                observed: self.observed.clone(),
            })
        }
    }

    /// A well-behaved IOS login: banner, prompt, and replies to the two
    /// preparation commands.
    pub fn ios_login() -> Vec<Step> {
        vec![
            Step::Data(b"\r\nrouter#".to_vec()),
            Step::Data(b"terminal width 511\r\nrouter#".to_vec()),
            Step::Data(b"terminal length 0\r\nrouter#".to_vec()),
        ]
    }

    pub fn data(text: &str) -> Step {
        Step::Data(text.as_bytes().to_vec())
    }
}
