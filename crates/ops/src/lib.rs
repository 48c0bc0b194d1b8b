//! Lifecycle operations for classified desktop applications.
//!
//! An [`OperationCollection`] holds one [`Operation`] handler per
//! [`OperationDescriptor`](vdm_detect::OperationDescriptor) and maps each
//! [`LifecycleEvent`] onto the handler's load/fetch/template capabilities.
//! Handlers reach the OS only through [`SystemEnvironment`] and
//! [`ProcessProbe`](vdm_detect::ProcessProbe).

mod collection;
mod config;
mod environment;
mod error;
mod event;
pub mod handlers;
mod operation;

pub use collection::OperationCollection;
pub use config::{OpsConfig, Platform};
pub use environment::{
    RealSystemEnvironment, RecordedCall, RecordingEnvironment, ScriptedResponse, SystemEnvironment,
};
pub use error::{OpsError, OpsResult};
pub use event::{EventKind, FetchCode, LifecycleEvent, LoadCode};
pub use handlers::HandlerContext;
pub use operation::{Operation, TemplateId};
