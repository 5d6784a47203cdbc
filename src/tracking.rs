//! Persistent record of already-formatted files.
//!
//! The record is a set of paths with plain set semantics: re-adding a
//! tracked path is a no-op, and a file once tracked is never re-processed
//! by later invocations unless the record is externally cleared. The store
//! is a trait so the orchestrator can run against an in-memory record under
//! test or in dry runs.

use crate::fsio::atomic_write;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the tracking record, relative to the working tree.
pub const DEFAULT_TRACKING_FILE: &str = ".formatted_files.json";

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("failed to read tracking record {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write tracking record {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("tracking record {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// On-disk shape: `{ "formattedFiles": [ "<path>", ... ] }`
#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackingRecord {
    #[serde(rename = "formattedFiles", default)]
    formatted_files: Vec<PathBuf>,
}

pub trait TrackingStore {
    /// The previously formatted paths; empty if no record exists yet.
    fn load(&self) -> Result<BTreeSet<PathBuf>, TrackingError>;

    /// Overwrite the persisted record with exactly the given set.
    fn save(&mut self, tracked: &BTreeSet<PathBuf>) -> Result<(), TrackingError>;
}

/// JSON file store at a fixed path.
pub struct JsonTrackingStore {
    path: PathBuf,
}

impl JsonTrackingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackingStore for JsonTrackingStore {
    fn load(&self) -> Result<BTreeSet<PathBuf>, TrackingError> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| TrackingError::Read {
            path: self.path.clone(),
            source,
        })?;
        let record: TrackingRecord =
            serde_json::from_str(&contents).map_err(|source| TrackingError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(record.formatted_files.into_iter().collect())
    }

    fn save(&mut self, tracked: &BTreeSet<PathBuf>) -> Result<(), TrackingError> {
        let record = TrackingRecord {
            formatted_files: tracked.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&record).map_err(|source| TrackingError::Parse {
            path: self.path.clone(),
            source,
        })?;
        atomic_write(&self.path, json.as_bytes()).map_err(|source| TrackingError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryTrackingStore {
    tracked: BTreeSet<PathBuf>,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracked(tracked: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            tracked: tracked.into_iter().collect(),
        }
    }
}

impl TrackingStore for MemoryTrackingStore {
    fn load(&self) -> Result<BTreeSet<PathBuf>, TrackingError> {
        Ok(self.tracked.clone())
    }

    fn save(&mut self, tracked: &BTreeSet<PathBuf>) -> Result<(), TrackingError> {
        self.tracked = tracked.clone();
        Ok(())
    }
}
