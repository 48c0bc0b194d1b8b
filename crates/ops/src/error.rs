use vdm_detect::OperationDescriptor;
use vdm_exec::ExecError;

/// Error during dispatch or handler execution.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    /// Classified application without a registered handler.
    #[error("no handler registered for {0}")]
    NoHandler(OperationDescriptor),

    #[error("{descriptor} has no template for '{path}'")]
    UnsupportedFormat {
        descriptor: OperationDescriptor,
        path: String,
    },

    #[error("{descriptor} is unavailable: {reason}")]
    Unavailable {
        descriptor: OperationDescriptor,
        reason: String,
    },

    #[error("external command timed out after {seconds}s")]
    Timeout { seconds: u32 },

    /// Handler identity does not match the slot it was dispatched through.
    #[error("handler for {actual} dispatched as {expected}")]
    ContractViolation {
        expected: OperationDescriptor,
        actual: OperationDescriptor,
    },

    #[error("malformed handler state: {0}")]
    MalformedState(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("external command failed: {0}")]
    Execution(String),
}

impl OpsError {
    /// Stable machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            OpsError::NoHandler(_) => "no_handler",
            OpsError::UnsupportedFormat { .. } => "unsupported_format",
            OpsError::Unavailable { .. } => "unavailable",
            OpsError::Timeout { .. } => "timeout",
            OpsError::ContractViolation { .. } => "contract_violation",
            OpsError::MalformedState(_) => "malformed_state",
            OpsError::InvalidRequest(_) => "invalid_request",
            OpsError::Execution(_) => "execution",
        }
    }
}

impl From<ExecError> for OpsError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Timeout { seconds } => OpsError::Timeout { seconds },
            other => OpsError::Execution(other.to_string()),
        }
    }
}

impl From<vdm_state::StateError> for OpsError {
    fn from(e: vdm_state::StateError) -> Self {
        OpsError::MalformedState(e.to_string())
    }
}

pub type OpsResult<T> = Result<T, OpsError>;
