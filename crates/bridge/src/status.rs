//! Status codes returned to the host and the errors behind them.

use vdm_detect::ClassifyError;
use vdm_ops::OpsError;
use tracing::warn;
use vdm_state::{encode, OperationResult, StateError};

/// Integer status reported by every host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    NotFound = 0x2001,
    NoHandler = 0x2002,
    UnsupportedFormat = 0x2003,
    Unavailable = 0x2004,
    MalformedState = 0x2005,
    Timeout = 0x2006,
    ContractViolation = 0x2007,
    Io = 0x2008,
    NotStarted = 0x2009,
    InvalidRequest = 0x200A,
    /// An external command ran but failed.
    Execution = 0x200B,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Error surfaced through a host callback.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Ops(#[from] OpsError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("host bridge is not started")]
    NotStarted,

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("{0} panicked")]
    Panic(&'static str),

    /// A response could not be handed back to the host as a C string.
    #[error("response could not be returned: {0}")]
    Response(String),
}

impl BridgeError {
    pub fn status(&self) -> Status {
        match self {
            BridgeError::Classify(ClassifyError::NotFound(_)) => Status::NotFound,
            BridgeError::Ops(e) => match e {
                OpsError::NoHandler(_) => Status::NoHandler,
                OpsError::UnsupportedFormat { .. } => Status::UnsupportedFormat,
                OpsError::Unavailable { .. } => Status::Unavailable,
                OpsError::Timeout { .. } => Status::Timeout,
                OpsError::ContractViolation { .. } => Status::ContractViolation,
                OpsError::MalformedState(_) => Status::MalformedState,
                OpsError::InvalidRequest(_) => Status::InvalidRequest,
                OpsError::Execution(_) => Status::Execution,
            },
            BridgeError::State(StateError::Malformed(_)) => Status::MalformedState,
            BridgeError::State(StateError::Encode(_)) => Status::ContractViolation,
            BridgeError::State(StateError::Io { .. }) => Status::Io,
            BridgeError::InvalidRequest(_) => Status::InvalidRequest,
            BridgeError::NotStarted => Status::NotStarted,
            BridgeError::Runtime(_) => Status::Io,
            BridgeError::Panic(_) | BridgeError::Response(_) => Status::ContractViolation,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Classify(_) => "not_found",
            BridgeError::Ops(e) => e.kind(),
            BridgeError::State(StateError::Malformed(_)) => "malformed_state",
            BridgeError::State(StateError::Io { .. }) | BridgeError::Runtime(_) => "io",
            BridgeError::InvalidRequest(_) => "invalid_request",
            BridgeError::NotStarted => "not_started",
            BridgeError::State(StateError::Encode(_))
            | BridgeError::Panic(_)
            | BridgeError::Response(_) => "contract_violation",
        }
    }

    /// `{"error": kind, "message": text, "status": code}`
    pub fn to_record(&self) -> OperationResult {
        OperationResult::new()
            .with("error", self.kind())
            .with("message", self.to_string())
            .with("status", self.status().code())
    }

    /// Encoded error record for the host.
    pub fn to_payload(&self) -> Vec<u8> {
        encode(&self.to_record()).unwrap_or_else(|e| {
            warn!(error = %e, "Error record did not encode, building it directly");
            serde_json::json!({
                "error": self.kind(),
                "message": self.to_string(),
                "status": self.status().code(),
            })
            .to_string()
            .into_bytes()
        })
    }
}
