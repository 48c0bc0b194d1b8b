//! The loaded extension: registry, handlers and the runtime that drives them.

use std::path::Path;

use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};
use vdm_detect::ClassificationRegistry;
use vdm_ops::{EventKind, HandlerContext, LifecycleEvent, OperationCollection};
use vdm_state::{encode, OperationResult, StateEnvelope, StateFile};

use crate::status::{BridgeError, Status};

/// A lifecycle request as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerRequest {
    /// Process or application name, e.g. `chrome.exe`.
    pub app: String,
    #[serde(default = "default_event")]
    pub event: EventKind,
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub param: Option<String>,
}

fn default_event() -> EventKind {
    EventKind::Trigger
}

impl TriggerRequest {
    pub fn parse(bytes: &[u8]) -> Result<Self, BridgeError> {
        serde_json::from_slice(bytes).map_err(|e| BridgeError::InvalidRequest(e.to_string()))
    }

    fn event(&self) -> LifecycleEvent {
        LifecycleEvent {
            kind: self.event,
            code: self.code,
            param: self.param.clone(),
        }
    }
}

/// Status plus encoded response, as handed back through `onTrigger`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOutcome {
    pub status: Status,
    /// Encoded result on success, encoded error record otherwise.
    pub payload: Vec<u8>,
}

impl From<Result<OperationResult, BridgeError>> for TriggerOutcome {
    fn from(result: Result<OperationResult, BridgeError>) -> Self {
        match result.and_then(|state| encode(&state).map_err(BridgeError::from)) {
            Ok(payload) => Self {
                status: Status::Ok,
                payload,
            },
            Err(e) => Self::failure(&e),
        }
    }
}

impl TriggerOutcome {
    pub fn failure(error: &BridgeError) -> Self {
        Self {
            status: error.status(),
            payload: error.to_payload(),
        }
    }
}

/// Everything built by `onStart` and released by `onStop`.
pub struct OpsCore {
    registry: ClassificationRegistry,
    collection: OperationCollection,
    runtime: Runtime,
}

impl OpsCore {
    /// Production core: logging, config from the environment, real OS access.
    pub fn start() -> Result<Self, BridgeError> {
        crate::logging::init();
        let config = crate::config::load();
        info!(platform = %config.platform, "Starting ops core");
        let ctx = HandlerContext::system(config);
        Self::with_parts(
            ClassificationRegistry::builtin(),
            OperationCollection::standard(&ctx),
        )
    }

    pub fn with_parts(
        registry: ClassificationRegistry,
        collection: OperationCollection,
    ) -> Result<Self, BridgeError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("vdm-ops")
            .enable_all()
            .build()
            .map_err(BridgeError::Runtime)?;
        debug!(
            names = registry.len(),
            handlers = collection.len(),
            "Ops core ready"
        );
        Ok(Self {
            registry,
            collection,
            runtime,
        })
    }

    pub fn registry(&self) -> &ClassificationRegistry {
        &self.registry
    }

    pub fn collection(&self) -> &OperationCollection {
        &self.collection
    }

    /// Snapshot every handler into the state file at `path`.
    pub fn on_save(&self, path: &Path) -> Result<(), BridgeError> {
        let handlers = self.runtime.block_on(self.collection.snapshot_all());
        StateFile::new(path).save(&StateEnvelope::new(handlers))?;
        info!(path = %path.display(), "State saved");
        Ok(())
    }

    /// Restore handler state from `path`. An empty file is a no-op.
    pub fn on_resume(&self, path: &Path) -> Result<(), BridgeError> {
        let Some(envelope) = StateFile::new(path).load()? else {
            info!(path = %path.display(), "Nothing to resume");
            return Ok(());
        };
        self.runtime
            .block_on(self.collection.restore_all(&envelope.handlers))?;
        info!(path = %path.display(), saved_at_ms = envelope.saved_at_ms, "State resumed");
        Ok(())
    }

    /// Save, then forget all handler state.
    pub fn on_close(&self, path: &Path) -> Result<(), BridgeError> {
        self.on_save(path)?;
        self.runtime.block_on(self.collection.reset_all());
        info!("Handler state cleared");
        Ok(())
    }

    /// Classify the requested application and dispatch the event.
    pub fn handle(&self, request: &TriggerRequest) -> Result<OperationResult, BridgeError> {
        let descriptor = self.registry.classify(&request.app)?;
        debug!(app = %request.app, %descriptor, event = %request.event, "Classified");
        let event = request.event();
        let state = self
            .runtime
            .block_on(self.collection.dispatch(descriptor, &event))?;
        Ok(state)
    }

    /// `handle` for a raw JSON request, with errors folded into the outcome.
    pub fn on_trigger(&self, request: &[u8]) -> TriggerOutcome {
        let result = TriggerRequest::parse(request).and_then(|r| self.handle(&r));
        if let Err(e) = &result {
            warn!(error = %e, status = e.status().code(), "Trigger failed");
        }
        result.into()
    }

    /// Current snapshot of every handler.
    pub fn state(&self) -> OperationResult {
        self.runtime.block_on(self.collection.snapshot_all())
    }
}
