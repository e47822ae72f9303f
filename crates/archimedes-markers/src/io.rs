//! JSON helpers for recorded marker detections.

use crate::MarkerDetections;
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum MarkersIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MarkerDetections {
    /// Load detections from a JSON file.
    ///
    /// The expected shape is
    /// `{"markers": {"markers": [{"id": 0, "corners": [[x, y], ...]}]}, "rejected": []}`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, MarkersIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write detections to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), MarkersIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
