//! State model and persistence for vdm-ops.
//!
//! - [`OperationResult`]: ordered field/value record produced by handlers
//! - [`encode`] / [`decode`]: compact, canonical interchange format
//! - [`StateFile`]: versioned snapshot files written by the host bridge

mod codec;
mod store;
mod value;

pub use codec::{decode, encode};
pub use store::{StateEnvelope, StateFile, STATE_VERSION};
pub use value::{OperationResult, StateValue};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("malformed state: {0}")]
    Malformed(String),
    #[error("failed to encode state: {0}")]
    Encode(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StateError>;
