//! Application identification for vdm-ops.
//!
//! Turns a process or application name into an [`OperationDescriptor`]:
//! - `fingerprint` - CRC-8 checksum used as a fast lookup key
//! - `catalog` - the fixed Category/Software enumerations and name table
//! - `registry` - fingerprint-indexed classification with exact-match fallback
//! - `probe` - discovery of running processes (sysinfo-backed)

mod catalog;
mod fingerprint;
mod probe;
mod registry;

pub use catalog::{
    Category, OperationDescriptor, ParseDescriptorError, Software, KNOWN_APPLICATIONS,
};
pub use fingerprint::fingerprint;
pub use probe::{InMemoryProbe, NullProbe, ProcessInfo, ProcessProbe, SysinfoProbe};
pub use registry::{ClassificationRegistry, ClassifyError};

