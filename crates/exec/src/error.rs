//! Errors from running external processes.

use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    /// Spawned, but could not be run or observed.
    #[error("process failed: {message}")]
    ExecutionFailed { message: String },

    #[error("process exceeded its {seconds}s limit")]
    Timeout { seconds: u32 },

    #[error("program not found: {program}")]
    CommandNotFound { program: String },

    #[error("not allowed to run {path}")]
    PermissionDenied { path: String },
}

impl ExecError {
    pub(crate) fn from_spawn(program: &str, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::CommandNotFound {
                program: program.into(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: program.into(),
            },
            _ => Self::ExecutionFailed {
                message: format!("{program}: {e}"),
            },
        }
    }
}
