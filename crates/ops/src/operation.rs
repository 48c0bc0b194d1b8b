//! The per-application operation contract.

use async_trait::async_trait;
use std::fmt;
use vdm_detect::OperationDescriptor;
use vdm_state::OperationResult;

use crate::error::OpsResult;

/// Identifier of a document template a handler knows how to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(pub &'static str);

impl TemplateId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Operations a handler performs for exactly one application.
///
/// Handlers are built once and shared behind `Arc<dyn Operation>`, so all
/// mutable state must be internally synchronized. Recoverable conditions
/// are reported as [`crate::OpsError`] values.
#[async_trait]
pub trait Operation: Send + Sync {
    /// The application this handler serves. Never changes.
    fn descriptor(&self) -> OperationDescriptor;

    /// Map a file path or URL to a template id.
    fn resolve_template(&self, path: &str) -> OpsResult<TemplateId>;

    /// Perform a load action. See [`crate::LoadCode`] for the codes.
    async fn load(&self, code: i32, param: Option<&str>) -> OpsResult<()>;

    /// Report state. See [`crate::FetchCode`] for the codes.
    async fn fetch(&self, code: i32) -> OpsResult<OperationResult>;

    /// Export the handler's persistent state.
    fn snapshot(&self) -> OperationResult {
        OperationResult::new()
    }

    /// Check that `state` could be restored, without applying it.
    fn validate_state(&self, _state: &OperationResult) -> OpsResult<()> {
        Ok(())
    }

    /// Replace the handler's state with a previously exported snapshot.
    fn restore(&self, state: &OperationResult) -> OpsResult<()> {
        self.validate_state(state)
    }

    /// Forget all handler state.
    fn reset(&self) {}
}
