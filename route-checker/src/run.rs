//! One capture run: connect, capture, persist raw, parse, persist structured.

use std::fmt;

use log::{debug, error, info, warn};

use crate::artifact::{ArtifactPair, ArtifactWriter};
use crate::error::Error;
use crate::normalize::{self, RoutingEntry};
use crate::session::SessionManager;
use crate::target::Target;
use crate::timestamp::CaptureTimestamp;
use crate::transport::Connector;

/// The status command captured by a run.
pub const DEFAULT_COMMAND: &str = "show ip route";

/// Stages of a run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunStage {
    Idle,
    Connecting,
    Negotiating,
    /// Reading the command output and writing it to the raw file.
    Capturing,
    Parsing,
    /// Writing the structured file.
    Persisting,
    Persisted,
    Failed,
}

impl RunStage {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Persisted | RunStage::Failed)
    }

    fn as_str(self) -> &'static str {
        match self {
            RunStage::Idle => "idle",
            RunStage::Connecting => "connecting",
            RunStage::Negotiating => "negotiating",
            RunStage::Capturing => "capturing",
            RunStage::Parsing => "parsing",
            RunStage::Persisting => "persisting",
            RunStage::Persisted => "persisted",
            RunStage::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the stages a run moves through. Transitions only go forward.
#[derive(Debug, Clone)]
pub struct RunTracker {
    stage: RunStage,
    history: Vec<RunStage>,
}

impl RunTracker {
    /// A tracker in `Idle`.
    pub fn new() -> Self {
        Self {
            stage: RunStage::Idle,
            history: vec![RunStage::Idle],
        }
    }

    /// Current stage.
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Every stage entered so far, oldest first.
    pub fn history(&self) -> &[RunStage] {
        &self.history
    }

    /// Enter `next`. Backward moves and moves out of a terminal stage are
    /// ignored with a warning.
    pub fn advance(&mut self, next: RunStage) {
        if self.stage.is_terminal() || next <= self.stage {
            warn!("ignoring run transition {} -> {}", self.stage, next);
            return;
        }
        debug!("run stage {} -> {}", self.stage, next);
        self.stage = next;
        self.history.push(next);
    }

    /// Enter `Failed`, recording the stage the error happened in.
    pub fn fail(&mut self, error: Error) -> RunFailure {
        let stage = self.stage;
        if !self.stage.is_terminal() {
            self.stage = RunStage::Failed;
            self.history.push(RunStage::Failed);
        }
        RunFailure { stage, error }
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A run that ended in `Failed`.
#[derive(Debug)]
pub struct RunFailure {
    /// Stage the run was in when it failed.
    pub stage: RunStage,
    pub error: Error,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed while {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub host: String,
    pub captured_at: CaptureTimestamp,
    pub artifacts: ArtifactPair,
    pub entries: Vec<RoutingEntry>,
    /// Lines passed over by a lenient parse.
    pub skipped: usize,
}

/// Capture pipeline for one target.
pub struct CaptureRun<C> {
    sessions: SessionManager<C>,
    writer: ArtifactWriter,
    command: String,
    lenient: bool,
}

impl<C: Connector> CaptureRun<C> {
    /// Create a run capturing [`DEFAULT_COMMAND`] strictly.
    pub fn new(sessions: SessionManager<C>, writer: ArtifactWriter) -> Self {
        Self {
            sessions,
            writer,
            command: DEFAULT_COMMAND.to_string(),
            lenient: false,
        }
    }

    /// Capture a different command.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Pass over unparsable lines instead of failing.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Execute the run against `target`.
    ///
    /// Any failure is logged once here with host, command and stage.
    pub async fn execute(&self, target: &Target) -> Result<RunReport, RunFailure> {
        let mut tracker = RunTracker::new();
        let result = self.pipeline(target, &mut tracker).await;

        if let Err(failure) = &result {
            error!(
                "capture of '{}' on {} failed while {}: {}",
                self.command, target.host, failure.stage, failure.error
            );
        }
        result
    }

    async fn pipeline(
        &self,
        target: &Target,
        tracker: &mut RunTracker,
    ) -> Result<RunReport, RunFailure> {
        let capture = self.sessions.capture(target, &self.command, tracker).await?;
        let captured_at = capture.captured_at();
        if capture.is_empty() {
            info!("{} returned no output on {}", capture.command(), target.host);
        }

        let raw_path = self
            .writer
            .write_raw(&target.host, captured_at, capture.text())
            .map_err(|e| tracker.fail(e.into()))?;

        tracker.advance(RunStage::Parsing);
        let (entries, skipped) = if self.lenient {
            let report = normalize::parse_report(capture.text(), target.device_kind, &self.command)
                .map_err(|e| tracker.fail(e.into()))?;
            for line in &report.skipped {
                warn!("skipped line {}: {}", line.line, line.text);
            }
            (report.entries, report.skipped.len())
        } else {
            let entries = normalize::parse(capture.text(), target.device_kind, &self.command)
                .map_err(|e| tracker.fail(e.into()))?;
            (entries, 0)
        };
        debug!("Parsed the raw result into {} entries", entries.len());

        tracker.advance(RunStage::Persisting);
        let structured_path = self
            .writer
            .write_structured(&target.host, captured_at, &entries)
            .map_err(|e| tracker.fail(e.into()))?;

        tracker.advance(RunStage::Persisted);
        info!("Captured {} routes from {}", entries.len(), target.host);

        Ok(RunReport {
            host: target.host.clone(),
            captured_at,
            artifacts: ArtifactPair {
                raw_path,
                structured_path,
            },
            entries,
            skipped,
        })
    }
}
