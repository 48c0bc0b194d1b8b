//! State files written by save/close and read by resume.

use std::path::{Path, PathBuf};

use crate::codec::{decode, encode};
use crate::value::OperationResult;
use crate::{Result, StateError};

/// Current on-disk envelope version.
pub const STATE_VERSION: i64 = 1;

/// Decoded contents of a state file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEnvelope {
    pub version: i64,
    pub saved_at_ms: i64,
    /// Per-handler snapshots keyed by descriptor.
    pub handlers: OperationResult,
}

impl StateEnvelope {
    pub fn new(handlers: OperationResult) -> Self {
        Self {
            version: STATE_VERSION,
            saved_at_ms: chrono::Utc::now().timestamp_millis(),
            handlers,
        }
    }

    fn to_record(&self) -> OperationResult {
        OperationResult::new()
            .with("version", self.version)
            .with("saved_at_ms", self.saved_at_ms)
            .with("handlers", self.handlers.clone())
    }

    fn from_record(record: &OperationResult) -> Result<Self> {
        let version = record
            .get_int("version")
            .ok_or_else(|| StateError::Malformed("missing version".to_string()))?;
        if version != STATE_VERSION {
            return Err(StateError::Malformed(format!(
                "unsupported state version {version}"
            )));
        }

        Ok(Self {
            version,
            saved_at_ms: record.get_int("saved_at_ms").unwrap_or_default(),
            handlers: record
                .get_map("handlers")
                .cloned()
                .ok_or_else(|| StateError::Malformed("missing handlers".to_string()))?,
        })
    }
}

/// A state file at a host-chosen path.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the envelope, replacing any previous file atomically.
    pub fn save(&self, envelope: &StateEnvelope) -> Result<()> {
        let bytes = encode(&envelope.to_record())?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        let tmp = self.path.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&tmp, &bytes).map_err(|e| self.io_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            self.io_error(&self.path, e)
        })?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "State saved");
        Ok(())
    }

    /// Read the envelope back.
    ///
    /// An empty file means there is nothing to resume and yields `None`.
    pub fn load(&self) -> Result<Option<StateEnvelope>> {
        let bytes = std::fs::read(&self.path).map_err(|e| self.io_error(&self.path, e))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(path = %self.path.display(), "Empty state file");
            return Ok(None);
        }

        let record = decode(&bytes)?;
        StateEnvelope::from_record(&record).map(Some)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StateError {
        StateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_record_round_trip() {
        let envelope = StateEnvelope::new(OperationResult::new().with("a", 1));
        let record = envelope.to_record();
        assert_eq!(StateEnvelope::from_record(&record).unwrap(), envelope);
    }

    #[test]
    fn test_envelope_rejects_other_versions() {
        let record = OperationResult::new()
            .with("version", 99)
            .with("handlers", OperationResult::new());
        assert!(matches!(
            StateEnvelope::from_record(&record),
            Err(StateError::Malformed(_))
        ));
    }

    #[test]
    fn test_envelope_requires_handlers() {
        let record = OperationResult::new().with("version", STATE_VERSION);
        assert!(StateEnvelope::from_record(&record).is_err());
    }
}
