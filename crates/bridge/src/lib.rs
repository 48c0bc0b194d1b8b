//! Host bridge for vdm-ops.
//!
//! The host loads this library and drives it through six callbacks:
//! `onStart`, `onStop`, `onSave`, `onResume`, `onClose` and `onTrigger`.
//! [`OpsCore`] implements them in Rust; [`ffi`] exports them with a C ABI.

mod config;
pub mod ffi;
mod host;
mod logging;
mod status;

pub use config::{load as load_config, load_from as load_config_from, ConfigError, CONFIG_ENV};
pub use host::{OpsCore, TriggerOutcome, TriggerRequest};
pub use logging::init as init_logging;
pub use status::{BridgeError, Status};
