//! Mutable per-handler state and its record form.

use std::sync::Mutex;

use vdm_state::{OperationResult, StateValue};

use crate::error::{OpsError, OpsResult};

const DOCUMENT: &str = "document";
const LOADS: &str = "loads";
const LAST_FETCH: &str = "last_fetch";

/// What a handler remembers between events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HandlerState {
    /// Last document (or URL, message, wallpaper) the handler acted on.
    pub document: Option<String>,
    /// Number of load actions performed.
    pub loads: i64,
    pub last_fetch: Option<OperationResult>,
    /// Handler-specific fields, stored alongside the common ones.
    pub extra: OperationResult,
}

impl HandlerState {
    pub fn to_record(&self) -> OperationResult {
        let mut record = self.extra.clone();
        record.insert(LOADS, self.loads);
        if let Some(document) = &self.document {
            record.insert(DOCUMENT, document.as_str());
        }
        if let Some(last) = &self.last_fetch {
            record.insert(LAST_FETCH, last.clone());
        }
        record
    }

    pub fn validate(record: &OperationResult) -> OpsResult<()> {
        for (key, value) in record.iter() {
            let ok = match key {
                LOADS => matches!(value, StateValue::Int(n) if *n >= 0),
                DOCUMENT => matches!(value, StateValue::Str(_)),
                LAST_FETCH => matches!(value, StateValue::Map(_)),
                _ => true,
            };
            if !ok {
                return Err(OpsError::MalformedState(format!(
                    "field '{key}' has an unexpected value"
                )));
            }
        }
        Ok(())
    }

    pub fn from_record(record: &OperationResult) -> OpsResult<Self> {
        Self::validate(record)?;
        let mut extra = record.clone();
        extra.remove(LOADS);
        extra.remove(DOCUMENT);
        extra.remove(LAST_FETCH);
        Ok(Self {
            document: record.get_str(DOCUMENT).map(str::to_string),
            loads: record.get_int(LOADS).unwrap_or(0),
            last_fetch: record.get_map(LAST_FETCH).cloned(),
            extra,
        })
    }
}

/// Internally synchronized [`HandlerState`].
#[derive(Debug, Default)]
pub(crate) struct StateCell {
    inner: Mutex<HandlerState>,
}

impl StateCell {
    pub fn with<R>(&self, f: impl FnOnce(&mut HandlerState) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn snapshot(&self) -> OperationResult {
        self.with(|s| s.to_record())
    }

    pub fn restore(&self, record: &OperationResult) -> OpsResult<()> {
        let restored = HandlerState::from_record(record)?;
        self.with(|s| *s = restored);
        Ok(())
    }

    pub fn reset(&self) {
        self.with(|s| *s = HandlerState::default());
    }
}
