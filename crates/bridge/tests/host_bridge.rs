//! Host callbacks driven through `OpsCore` with a scripted environment.

use std::path::Path;
use std::sync::Arc;

use vdm_bridge::{BridgeError, OpsCore, Status, TriggerRequest};
use vdm_detect::{ClassificationRegistry, InMemoryProbe};
use vdm_ops::{
    EventKind, HandlerContext, OperationCollection, OpsConfig, Platform, RecordingEnvironment,
};
use vdm_state::decode;

struct Harness {
    core: OpsCore,
    env: Arc<RecordingEnvironment>,
    probe: Arc<InMemoryProbe>,
}

fn harness() -> Harness {
    let probe = Arc::new(InMemoryProbe::new());
    let env = Arc::new(RecordingEnvironment::with_probe(probe.clone()));
    let config = OpsConfig {
        platform: Platform::Linux,
        launch_settle_ms: 20,
        ..Default::default()
    };
    let ctx = HandlerContext::new(config, env.clone(), probe.clone());
    let core = OpsCore::with_parts(
        ClassificationRegistry::builtin(),
        OperationCollection::standard(&ctx),
    )
    .unwrap();
    Harness { core, env, probe }
}

fn request(app: &str, event: EventKind, param: Option<&str>) -> TriggerRequest {
    TriggerRequest {
        app: app.to_string(),
        event,
        code: 0,
        param: param.map(String::from),
    }
}

#[test]
fn test_unknown_app_is_not_found() {
    let h = harness();
    let outcome = h.core.on_trigger(br#"{"app":"unknown_app.exe"}"#);

    assert_eq!(outcome.status, Status::NotFound);
    assert_eq!(outcome.status.code(), 0x2001);
    let record = decode(&outcome.payload).unwrap();
    assert_eq!(record.get_str("error"), Some("not_found"));
    assert_eq!(record.get_int("status"), Some(0x2001));
    assert!(h.env.calls().is_empty());
}

#[test]
fn test_chrome_trigger_succeeds() {
    let h = harness();
    h.probe.add(4242, "chrome.exe", &["chrome.exe"]);
    h.probe.add(4243, "chrome", &["chrome", "https://example.org"]);

    let outcome = h.core.on_trigger(br#"{"app":"chrome.exe","event":"trigger"}"#);
    assert_eq!(outcome.status, Status::Ok);

    let state = decode(&outcome.payload).unwrap();
    assert_eq!(state.get_str("descriptor"), Some("webpages/chrome"));
    assert_eq!(state.get_str("url"), Some("https://example.org"));
}

#[test]
fn test_malformed_request() {
    let h = harness();
    let outcome = h.core.on_trigger(b"not json");
    assert_eq!(outcome.status, Status::InvalidRequest);
}

#[test]
fn test_handler_errors_map_to_status() {
    let h = harness();
    let err = h
        .core
        .handle(&request("wps", EventKind::Trigger, Some("/tmp/movie.mkv")))
        .unwrap_err();
    assert_eq!(err.status(), Status::UnsupportedFormat);

    let err = h
        .core
        .handle(&request("firefox", EventKind::Save, None))
        .unwrap_err();
    assert_eq!(err.status(), Status::Unavailable);
}

#[test]
fn test_save_then_resume_on_fresh_core() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ops.state");

    let first = harness();
    first
        .core
        .handle(&request("gedit", EventKind::Start, Some("/tmp/todo.txt")))
        .unwrap();
    first
        .core
        .handle(&request("notify-osd", EventKind::Start, Some("saved")))
        .unwrap();
    first.core.on_save(&path).unwrap();
    let saved = first.core.state();

    let second = harness();
    assert_ne!(second.core.state(), saved);
    second.core.on_resume(&path).unwrap();
    assert_eq!(second.core.state(), saved);
}

#[test]
fn test_resume_empty_file_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.state");
    std::fs::write(&path, b"").unwrap();

    let h = harness();
    let before = h.core.state();
    h.core.on_resume(&path).unwrap();
    assert_eq!(h.core.state(), before);
}

#[test]
fn test_resume_garbage_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.state");
    std::fs::write(&path, b"{\"version\":1,").unwrap();

    let err = harness().core.on_resume(&path).unwrap_err();
    assert_eq!(err.status(), Status::MalformedState);
}

#[test]
fn test_resume_unknown_descriptor_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.state");
    std::fs::write(
        &path,
        br#"{"handlers":{"games/solitaire":{}},"saved_at_ms":0,"version":1}"#,
    )
    .unwrap();

    let err = harness().core.on_resume(&path).unwrap_err();
    assert!(matches!(err, BridgeError::Ops(_)));
    assert_eq!(err.status(), Status::MalformedState);
}

#[test]
fn test_resume_missing_file_is_io() {
    let err = harness()
        .core
        .on_resume(Path::new("/nonexistent/dir/ops.state"))
        .unwrap_err();
    assert_eq!(err.status(), Status::Io);
}

#[test]
fn test_close_saves_and_clears() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("close.state");

    let h = harness();
    h.core
        .handle(&request("typora", EventKind::Start, Some("/tmp/a.md")))
        .unwrap();
    let before = h.core.state();
    h.core.on_close(&path).unwrap();
    assert_ne!(h.core.state(), before);

    let fresh = harness();
    fresh.core.on_resume(&path).unwrap();
    assert_eq!(fresh.core.state(), before);
}
