//! Run logging: console through `env_logger`, plus a size-rotated log file.
//!
//! The logger is installed once per process with [`RunLogger::init`]; the
//! returned [`LogGuard`] flushes every sink when dropped. Tests build a
//! logger over any writer with [`RunLogger::with_sink`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

use crate::error::ConfigError;

/// Log file rotates once it would grow past this size.
pub const MAX_LOG_BYTES: u64 = 5_000_000;

/// Number of rotated log files kept (`route-checker.log.1` ... `.7`).
pub const LOG_BACKUPS: usize = 7;

const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Records from other crates below this level are kept out of the file.
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Info;

/// A log file that rotates by size.
///
/// Rotation shifts `path.N` to `path.N+1`, dropping the oldest, then moves
/// `path` to `path.1` and starts a fresh file.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingFile {
    /// Open `path` for appending.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            written,
            max_bytes,
            backups,
        })
    }

    /// Path of the live file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = File::create(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Logger for one run of the tool.
pub struct RunLogger {
    console: Option<env_logger::Logger>,
    sink: Option<Mutex<Box<dyn Write + Send>>>,
    sink_level: LevelFilter,
}

impl RunLogger {
    /// Console at info (debug with `debug`), file at debug.
    pub fn new(debug: bool, log_file: Option<&Path>) -> Result<Self, ConfigError> {
        let console_level = if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        let console = env_logger::Builder::new()
            .filter_level(console_level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .build();

        let sink = match log_file {
            Some(path) => {
                let file = RotatingFile::open(path, MAX_LOG_BYTES, LOG_BACKUPS).map_err(
                    |source| ConfigError::LogFile {
                        path: path.to_path_buf(),
                        source,
                    },
                )?;
                Some(Mutex::new(Box::new(file) as Box<dyn Write + Send>))
            }
            None => None,
        };

        Ok(Self {
            console: Some(console),
            sink,
            sink_level: LevelFilter::Debug,
        })
    }

    /// A logger writing formatted lines to `sink` only.
    pub fn with_sink(sink: Box<dyn Write + Send>, level: LevelFilter) -> Self {
        Self {
            console: None,
            sink: Some(Mutex::new(sink)),
            sink_level: level,
        }
    }

    fn max_level(&self) -> LevelFilter {
        let console = self
            .console
            .as_ref()
            .map_or(LevelFilter::Off, |c| c.filter());
        let sink = if self.sink.is_some() {
            self.sink_level
        } else {
            LevelFilter::Off
        };
        console.max(sink)
    }

    fn sink_accepts(&self, metadata: &Metadata<'_>) -> bool {
        if metadata.level() > self.sink_level {
            return false;
        }
        metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
            || metadata.level() <= DEPENDENCY_LEVEL
    }

    /// Install as the global logger.
    pub fn init(self) -> Result<LogGuard, ConfigError> {
        let level = self.max_level();
        log::set_boxed_logger(Box::new(self)).map_err(|_| ConfigError::LoggerInstalled)?;
        log::set_max_level(level);
        Ok(LogGuard { _private: () })
    }
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.console.as_ref().is_some_and(|c| c.enabled(metadata)) || self.sink_accepts(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if let Some(console) = &self.console {
            if console.matches(record) {
                console.log(record);
            }
        }

        if self.sink.is_none() || !self.sink_accepts(record.metadata()) {
            return;
        }
        if let Some(sink) = &self.sink {
            if let Ok(mut sink) = sink.lock() {
                let _ = writeln!(
                    sink,
                    "{} {} {}",
                    Local::now().format(LINE_TIME_FORMAT),
                    record.level(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        if let Some(console) = &self.console {
            console.flush();
        }
        if let Some(sink) = &self.sink {
            if let Ok(mut sink) = sink.lock() {
                let _ = sink.flush();
            }
        }
    }
}

/// Flushes the installed logger when dropped.
#[must_use = "dropping the guard flushes the log immediately"]
pub struct LogGuard {
    _private: (),
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        log::logger().flush();
    }
}
