//! Bounded external process execution.
//!
//! This crate provides:
//! - Synchronous command execution (program + args, no shell) with a hard timeout
//! - Detached launches for long-running GUI applications
//! - Process tree cleanup on timeout
//! - A bounded retry helper for waiting on freshly launched processes
//!
//! # Example
//!
//! ```ignore
//! use vdm_exec::{execute_command, ExecutorConfig};
//!
//! let output = execute_command("gsettings", &args, &ExecutorConfig::default()).await?;
//! ```

mod error;
mod executor;
mod retry;

pub use error::{ExecError, ExecResult};
pub use executor::{
    execute_command, kill_tree, spawn_detached, terminate, CommandOutput, ExecutorConfig,
};
pub use retry::retry_with_timeout;
