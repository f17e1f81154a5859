//! # route-checker
//!
//! Snapshot the IPv4 routing table of a network device over SSH.
//!
//! One run opens a single session to one device, prepares it (wide terminal,
//! no pagination), captures `show ip route`, and writes two files named
//! `{host}-{YYYYMMDD-HHMMSS}`: the raw text (`.log`) and the parsed entries
//! as JSON (`.json`).
//!
//! ## Features
//!
//! - Async SSH sessions via russh, with known_hosts verification
//! - Settle-time output capture with pager handling
//! - Strict or lenient parsing of Cisco IOS routing tables
//! - Create-only artifact files; raw output survives a parse failure
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use route_checker::{ArtifactWriter, CaptureRun, SessionManager, SessionOptions, SshConnector, Target};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), route_checker::RunFailure> {
//!     let target = Target::new("192.168.1.1", "admin", "secret");
//!     let sessions = SessionManager::new(SshConnector::default(), SessionOptions::default());
//!     let run = CaptureRun::new(sessions, ArtifactWriter::new("."));
//!
//!     let report = run.execute(&target).await?;
//!     println!("{} routes", report.entries.len());
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod channel;
pub mod cli;
pub mod error;
pub mod exit;
pub mod logging;
pub mod normalize;
pub mod platform;
pub mod run;
pub mod session;
pub mod target;
pub mod timestamp;
pub mod transport;

// Re-export main types for convenience
pub use artifact::{ArtifactPair, ArtifactWriter};
pub use error::Error;
pub use normalize::{ParseReport, RoutingEntry, parse, parse_report};
pub use platform::{DeviceKind, PlatformDefinition, PlatformRegistry};
pub use run::{CaptureRun, RunFailure, RunReport, RunStage, RunTracker};
pub use session::{RawCapture, Session, SessionManager, SessionOptions, SessionState};
pub use target::{Target, TargetResolver};
pub use timestamp::CaptureTimestamp;
pub use transport::{Connector, HostKeyVerification, Shell, SshConfig, SshConnector};
