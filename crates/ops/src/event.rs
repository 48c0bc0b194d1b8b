//! Lifecycle events delivered by the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Stop,
    Save,
    Resume,
    Close,
    Trigger,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Stop => "stop",
            EventKind::Save => "save",
            EventKind::Resume => "resume",
            EventKind::Close => "close",
            EventKind::Trigger => "trigger",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A lifecycle request for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    /// Variant selector passed to load/fetch.
    #[serde(default)]
    pub code: i32,
    /// Handler-specific argument, usually a file path or URL.
    #[serde(default)]
    pub param: Option<String>,
}

impl LifecycleEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            code: 0,
            param: None,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }
}

/// Variants of `Operation::load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadCode {
    /// Launch the application, opening `param` when given.
    Open = 0,
    /// Ask the running application to exit.
    Terminate = 1,
    /// Reopen the last known document (or `param`).
    Restore = 2,
}

impl LoadCode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(LoadCode::Open),
            1 => Some(LoadCode::Terminate),
            2 => Some(LoadCode::Restore),
            _ => None,
        }
    }
}

/// Variants of `Operation::fetch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchCode {
    /// Probe the running application.
    Current = 0,
    /// Last known state without probing; never unavailable.
    Cached = 1,
}

impl FetchCode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(FetchCode::Current),
            1 => Some(FetchCode::Cached),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_defaults() {
        let event: LifecycleEvent = serde_json::from_str(r#"{"kind":"trigger"}"#).unwrap();
        assert_eq!(event, LifecycleEvent::new(EventKind::Trigger));
    }

    #[test]
    fn test_codes() {
        assert_eq!(LoadCode::from_code(2), Some(LoadCode::Restore));
        assert_eq!(LoadCode::from_code(9), None);
        assert_eq!(FetchCode::from_code(1), Some(FetchCode::Cached));
        assert_eq!(FetchCode::from_code(-1), None);
    }
}
