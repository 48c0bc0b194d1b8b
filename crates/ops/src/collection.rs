//! Handler table and lifecycle dispatch.
//!
//! One slot per descriptor. Each slot pairs the handler with an async
//! mutex held for the whole dispatch, so events for the same application
//! run one at a time while different applications proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};
use vdm_detect::OperationDescriptor;
use vdm_state::{OperationResult, StateValue};

use crate::error::{OpsError, OpsResult};
use crate::event::{EventKind, FetchCode, LifecycleEvent, LoadCode};
use crate::handlers::{standard_handlers, HandlerContext};
use crate::operation::Operation;

struct Slot {
    handler: Arc<dyn Operation>,
    lock: Mutex<()>,
}

/// All registered handlers, keyed by descriptor.
pub struct OperationCollection {
    slots: HashMap<OperationDescriptor, Slot>,
}

impl OperationCollection {
    pub fn empty() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Every built-in handler.
    pub fn standard(ctx: &HandlerContext) -> Self {
        let mut collection = Self::empty();
        for handler in standard_handlers(ctx) {
            collection.register(handler);
        }
        debug!(handlers = collection.len(), "Operation collection built");
        collection
    }

    /// Put `handler` in the slot for `descriptor`, replacing any previous one.
    ///
    /// The handler is not checked against the slot here; a mismatch is
    /// reported when the slot is dispatched.
    pub fn insert(&mut self, descriptor: OperationDescriptor, handler: Arc<dyn Operation>) {
        let slot = Slot {
            handler,
            lock: Mutex::new(()),
        };
        if self.slots.insert(descriptor, slot).is_some() {
            warn!(%descriptor, "Replaced existing handler");
        }
    }

    /// Insert under the handler's own descriptor.
    pub fn register(&mut self, handler: Arc<dyn Operation>) {
        self.insert(handler.descriptor(), handler);
    }

    pub fn get(&self, descriptor: OperationDescriptor) -> Option<Arc<dyn Operation>> {
        self.slots.get(&descriptor).map(|s| s.handler.clone())
    }

    pub fn contains(&self, descriptor: OperationDescriptor) -> bool {
        self.slots.contains_key(&descriptor)
    }

    /// Registered descriptors, sorted.
    pub fn descriptors(&self) -> Vec<OperationDescriptor> {
        let mut all: Vec<_> = self.slots.keys().copied().collect();
        all.sort();
        all
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Route one lifecycle event to the handler for `descriptor`.
    pub async fn dispatch(
        &self,
        descriptor: OperationDescriptor,
        event: &LifecycleEvent,
    ) -> OpsResult<OperationResult> {
        let slot = self
            .slots
            .get(&descriptor)
            .ok_or(OpsError::NoHandler(descriptor))?;

        let actual = slot.handler.descriptor();
        if actual != descriptor {
            error!(expected = %descriptor, %actual, "Handler registered under the wrong descriptor");
            return Err(OpsError::ContractViolation {
                expected: descriptor,
                actual,
            });
        }

        let _guard = slot.lock.lock().await;
        debug!(%descriptor, event = %event.kind, code = event.code, "Dispatching");

        let result = run_event(slot.handler.as_ref(), descriptor, event).await;
        if let Err(e) = &result {
            debug!(%descriptor, event = %event.kind, error = %e, "Dispatch failed");
        }
        result
    }

    /// Every handler's state, keyed by descriptor.
    pub async fn snapshot_all(&self) -> OperationResult {
        let mut all = OperationResult::new();
        for descriptor in self.descriptors() {
            let Some(slot) = self.slots.get(&descriptor) else {
                continue;
            };
            let _guard = slot.lock.lock().await;
            all.insert(descriptor.to_string(), slot.handler.snapshot());
        }
        all
    }

    /// Restore handler state from [`Self::snapshot_all`] output.
    ///
    /// Everything is validated before anything is applied, so a rejected
    /// state leaves all handlers untouched. Handlers missing from `state`
    /// are reset.
    pub async fn restore_all(&self, state: &OperationResult) -> OpsResult<()> {
        let mut entries: Vec<(OperationDescriptor, &OperationResult)> = Vec::new();
        for (key, value) in state.iter() {
            let descriptor: OperationDescriptor = key
                .parse()
                .map_err(|e| OpsError::MalformedState(format!("{e}")))?;
            let StateValue::Map(record) = value else {
                return Err(OpsError::MalformedState(format!(
                    "state for {descriptor} is not a record"
                )));
            };
            let slot = self
                .slots
                .get(&descriptor)
                .ok_or(OpsError::NoHandler(descriptor))?;
            slot.handler.validate_state(record)?;
            entries.push((descriptor, record));
        }

        let guards = self.lock_all().await;
        for (descriptor, slot) in &guards {
            match entries.iter().find(|(d, _)| d == descriptor) {
                Some((_, record)) => slot.handler.restore(record)?,
                None => slot.handler.reset(),
            }
        }
        debug!(restored = entries.len(), "Handler state restored");
        Ok(())
    }

    pub async fn reset_all(&self) {
        for (_, slot) in &self.lock_all().await {
            slot.handler.reset();
        }
    }

    /// Lock every slot in descriptor order.
    async fn lock_all(&self) -> Vec<(OperationDescriptor, LockedSlot<'_>)> {
        let mut locked = Vec::with_capacity(self.slots.len());
        for descriptor in self.descriptors() {
            if let Some(slot) = self.slots.get(&descriptor) {
                let guard = slot.lock.lock().await;
                locked.push((
                    descriptor,
                    LockedSlot {
                        handler: slot.handler.as_ref(),
                        _guard: guard,
                    },
                ));
            }
        }
        locked
    }
}

impl Default for OperationCollection {
    fn default() -> Self {
        Self::empty()
    }
}

struct LockedSlot<'a> {
    handler: &'a dyn Operation,
    _guard: MutexGuard<'a, ()>,
}

async fn run_event(
    handler: &dyn Operation,
    descriptor: OperationDescriptor,
    event: &LifecycleEvent,
) -> OpsResult<OperationResult> {
    let param = event.param.as_deref();
    match event.kind {
        EventKind::Start => {
            handler.load(event.code, param).await?;
            Ok(ack(descriptor, event.kind, event.code, param))
        }
        EventKind::Stop => {
            let code = LoadCode::Terminate as i32;
            handler.load(code, param).await?;
            Ok(ack(descriptor, event.kind, code, param))
        }
        EventKind::Save => handler.fetch(event.code).await,
        EventKind::Resume => {
            let code = LoadCode::Restore as i32;
            handler.load(code, param).await?;
            Ok(ack(descriptor, event.kind, code, param))
        }
        EventKind::Close => match handler.fetch(FetchCode::Current as i32).await {
            Ok(state) => {
                match handler.load(LoadCode::Terminate as i32, None).await {
                    Ok(()) | Err(OpsError::Unavailable { .. }) => {}
                    Err(e) => return Err(e),
                }
                Ok(state)
            }
            Err(OpsError::Unavailable { .. }) => {
                Ok(ack(descriptor, event.kind, event.code, param).with("running", 0i64))
            }
            Err(e) => Err(e),
        },
        EventKind::Trigger => match param {
            Some(path) => {
                let template = handler.resolve_template(path)?;
                Ok(OperationResult::new()
                    .with("descriptor", descriptor.to_string())
                    .with("path", path)
                    .with("template", template.as_str()))
            }
            None => handler.fetch(event.code).await,
        },
    }
}

fn ack(
    descriptor: OperationDescriptor,
    kind: EventKind,
    code: i32,
    param: Option<&str>,
) -> OperationResult {
    let mut record = OperationResult::new()
        .with("descriptor", descriptor.to_string())
        .with("event", kind.label())
        .with("code", code);
    if let Some(param) = param {
        record.insert("param", param);
    }
    record
}
