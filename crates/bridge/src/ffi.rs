//! C ABI exported to the host.
//!
//! Every entry point returns a [`Status`] code and never unwinds across the
//! boundary; a panic is reported as `ContractViolation`.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{debug, error, warn};

use crate::host::{OpsCore, TriggerOutcome};
use crate::status::{BridgeError, Status};

static CORE: RwLock<Option<Arc<OpsCore>>> = RwLock::new(None);

/// Request/response block passed to `onTrigger`.
///
/// `request` is a NUL-terminated JSON trigger request owned by the host.
/// On return `response` points to a NUL-terminated encoded result that the
/// host must release with [`vdm_string_free`].
#[repr(C)]
pub struct HostTrigger {
    pub request: *const c_char,
    pub response: *mut c_char,
}

fn current() -> Result<Arc<OpsCore>, BridgeError> {
    CORE.read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .ok_or(BridgeError::NotStarted)
}

fn guarded<F>(callback: &'static str, f: F) -> c_int
where
    F: FnOnce() -> Result<(), BridgeError>,
{
    let result = catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!(callback, "Panic caught at host boundary");
        Err(BridgeError::Panic(callback))
    });
    match result {
        Ok(()) => Status::Ok.code(),
        Err(e) => {
            warn!(callback, error = %e, "Callback failed");
            e.status().code()
        }
    }
}

/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn path_arg(ptr: *const c_char) -> Result<PathBuf, BridgeError> {
    if ptr.is_null() {
        return Err(BridgeError::InvalidRequest("null path".to_string()));
    }
    let path = CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| BridgeError::InvalidRequest("path is not UTF-8".to_string()))?;
    Ok(PathBuf::from(path))
}

/// Hand an outcome to the host. A payload that cannot become a C string is
/// replaced by an error record, never by an empty response.
fn into_response(outcome: TriggerOutcome) -> (c_int, *mut c_char) {
    match CString::new(outcome.payload) {
        Ok(response) => (outcome.status.code(), response.into_raw()),
        Err(e) => {
            error!(position = e.nul_position(), "Response contains a NUL byte");
            let err = BridgeError::Response(e.to_string());
            let mut bytes = err.to_payload();
            bytes.retain(|b| *b != 0);
            // SAFETY: every NUL byte was just removed.
            let response = unsafe { CString::from_vec_unchecked(bytes) };
            (err.status().code(), response.into_raw())
        }
    }
}

/// Build the core. Calling it again while started keeps the running core.
#[no_mangle]
pub extern "C" fn onStart() -> c_int {
    guarded("onStart", || {
        let mut slot = CORE.write().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            debug!("onStart while already started");
            return Ok(());
        }
        *slot = Some(Arc::new(OpsCore::start()?));
        Ok(())
    })
}

/// Drop the core and release all handlers.
#[no_mangle]
pub extern "C" fn onStop() -> c_int {
    guarded("onStop", || {
        let core = CORE.write().unwrap_or_else(|e| e.into_inner()).take();
        match core {
            Some(_) => Ok(()),
            None => Err(BridgeError::NotStarted),
        }
    })
}

/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn onSave(path: *const c_char) -> c_int {
    guarded("onSave", || current()?.on_save(&path_arg(path)?))
}

/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn onResume(path: *const c_char) -> c_int {
    guarded("onResume", || current()?.on_resume(&path_arg(path)?))
}

/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn onClose(path: *const c_char) -> c_int {
    guarded("onClose", || current()?.on_close(&path_arg(path)?))
}

/// # Safety
/// `event` must be null or point to a valid [`HostTrigger`] whose `request`
/// is null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn onTrigger(event: *mut c_void) -> c_int {
    let trigger = event.cast::<HostTrigger>();
    if trigger.is_null() {
        return Status::InvalidRequest.code();
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let request = (*trigger).request;
        if request.is_null() {
            return TriggerOutcome::failure(&BridgeError::InvalidRequest(
                "null request".to_string(),
            ));
        }
        let bytes = CStr::from_ptr(request).to_bytes();
        match current() {
            Ok(core) => core.on_trigger(bytes),
            Err(e) => TriggerOutcome::failure(&e),
        }
    }))
    .unwrap_or_else(|_| {
        error!(callback = "onTrigger", "Panic caught at host boundary");
        TriggerOutcome::failure(&BridgeError::Panic("onTrigger"))
    });

    let (status, response) = into_response(outcome);
    (*trigger).response = response;
    status
}

/// Release a string returned through [`HostTrigger::response`].
///
/// # Safety
/// `ptr` must be null or a pointer produced by this library, freed once.
#[no_mangle]
pub unsafe extern "C" fn vdm_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdm_state::decode;

    #[test]
    fn test_nul_in_payload_becomes_error_record() {
        let outcome = TriggerOutcome {
            status: Status::Ok,
            payload: b"{\"k\":\"a\0b\"}".to_vec(),
        };
        let (status, ptr) = into_response(outcome);
        assert_eq!(status, Status::ContractViolation.code());

        let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes().to_vec();
        unsafe { vdm_string_free(ptr) };
        let record = decode(&bytes).unwrap();
        assert_eq!(record.get_str("error"), Some("contract_violation"));
        assert_eq!(record.get_int("status"), Some(0x2007));
    }

    #[test]
    fn test_clean_payload_passes_through() {
        let outcome = TriggerOutcome {
            status: Status::Ok,
            payload: br#"{"running":1}"#.to_vec(),
        };
        let (status, ptr) = into_response(outcome);
        assert_eq!(status, 0);
        let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes().to_vec();
        unsafe { vdm_string_free(ptr) };
        assert_eq!(bytes, br#"{"running":1}"#.to_vec());
    }
}
