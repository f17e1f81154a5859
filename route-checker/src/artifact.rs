//! Artifact writer: raw and structured capture files.
//!
//! Both files of a run share a `{host}-{timestamp}` stem in the output
//! directory. Files are created, never replaced; a name that already exists
//! is a collision.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::StorageError;
use crate::normalize::RoutingEntry;
use crate::timestamp::CaptureTimestamp;

/// Extension of the raw capture file.
pub const RAW_EXTENSION: &str = "log";
/// Extension of the structured capture file.
pub const STRUCTURED_EXTENSION: &str = "json";

/// Paths of the two files written for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPair {
    pub raw_path: PathBuf,
    pub structured_path: PathBuf,
}

/// Writes capture artifacts into one directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer for `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The directory artifacts are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path an artifact for `host` at `timestamp` would have.
    pub fn path_for(&self, host: &str, timestamp: CaptureTimestamp, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}-{}.{}", file_stem_host(host), timestamp.token(), extension))
    }

    /// Write the raw capture text.
    pub fn write_raw(
        &self,
        host: &str,
        timestamp: CaptureTimestamp,
        raw: &str,
    ) -> Result<PathBuf, StorageError> {
        let path = self.path_for(host, timestamp, RAW_EXTENSION);
        create_and_write(&path, raw.as_bytes())?;
        info!("Raw output saved in {}", path.display());
        Ok(path)
    }

    /// Write the structured entries as pretty-printed JSON.
    pub fn write_structured(
        &self,
        host: &str,
        timestamp: CaptureTimestamp,
        entries: &[RoutingEntry],
    ) -> Result<PathBuf, StorageError> {
        let path = self.path_for(host, timestamp, STRUCTURED_EXTENSION);
        let json = serde_json::to_vec_pretty(entries)?;
        create_and_write(&path, &json)?;
        info!("Parsed output saved in {}", path.display());
        Ok(path)
    }

    /// Write raw first, then structured.
    ///
    /// If the structured write fails the raw file stays on disk.
    pub fn write(
        &self,
        host: &str,
        timestamp: CaptureTimestamp,
        raw: &str,
        entries: &[RoutingEntry],
    ) -> Result<ArtifactPair, StorageError> {
        let raw_path = self.write_raw(host, timestamp, raw)?;
        let structured_path = self.write_structured(host, timestamp, entries)?;
        Ok(ArtifactPair {
            raw_path,
            structured_path,
        })
    }

    /// Load a structured artifact back into entries.
    pub fn read_structured(path: &Path) -> Result<Vec<RoutingEntry>, StorageError> {
        let data = fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Host names become part of a file name; anything that is not safe there
/// is replaced with `_`.
fn file_stem_host(host: &str) -> String {
    host.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn create_and_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let write_err = |source: io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file: File = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => StorageError::Collision {
                path: path.to_path_buf(),
            },
            _ => write_err(source),
        })?;

    file.write_all(data).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    Ok(())
}
