//! System environment abstraction for testability.
//!
//! Handlers never spawn processes directly. They go through
//! [`SystemEnvironment`], so dispatch logic can be unit-tested without a
//! desktop session.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use vdm_detect::InMemoryProbe;
use vdm_exec::{CommandOutput, ExecError, ExecResult, ExecutorConfig};

/// Abstraction over the OS process capabilities handlers need.
pub trait SystemEnvironment: Send + Sync {
    /// Run a command to completion, bounded by the executor timeout.
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> Pin<Box<dyn Future<Output = ExecResult<CommandOutput>> + Send + '_>>;

    /// Start a long-running program without waiting on it. Returns its pid.
    fn launch(&self, program: &str, args: &[String]) -> ExecResult<u32>;

    /// Ask a process to exit, bounded by the executor timeout.
    fn terminate(&self, pid: u32) -> Pin<Box<dyn Future<Output = ExecResult<()>> + Send + '_>>;
}

/// Production implementation backed by `vdm-exec`.
pub struct RealSystemEnvironment {
    config: ExecutorConfig,
}

impl RealSystemEnvironment {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }
}

impl SystemEnvironment for RealSystemEnvironment {
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> Pin<Box<dyn Future<Output = ExecResult<CommandOutput>> + Send + '_>> {
        let program = program.to_string();
        let args = args.to_vec();
        Box::pin(async move { vdm_exec::execute_command(&program, &args, &self.config).await })
    }

    fn launch(&self, program: &str, args: &[String]) -> ExecResult<u32> {
        vdm_exec::spawn_detached(program, args)
    }

    fn terminate(&self, pid: u32) -> Pin<Box<dyn Future<Output = ExecResult<()>> + Send + '_>> {
        Box::pin(async move { vdm_exec::terminate(pid, &self.config).await })
    }
}

/// One call observed by [`RecordingEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Run { program: String, args: Vec<String> },
    Launch { program: String, args: Vec<String> },
    Terminate { pid: u32 },
}

/// Canned reply for [`RecordingEnvironment::run`].
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Output { stdout: String, success: bool },
    Timeout { seconds: u32 },
    NotFound,
}

impl ScriptedResponse {
    pub fn ok(stdout: impl Into<String>) -> Self {
        ScriptedResponse::Output {
            stdout: stdout.into(),
            success: true,
        }
    }

    fn into_result(self, program: &str) -> ExecResult<CommandOutput> {
        match self {
            ScriptedResponse::Output { stdout, success } => Ok(CommandOutput {
                success,
                exit_code: if success { 0 } else { 1 },
                stdout,
                stderr: if success {
                    String::new()
                } else {
                    format!("{program} failed")
                },
                truncated: false,
                duration_ms: 0,
                pid: None,
            }),
            ScriptedResponse::Timeout { seconds } => Err(ExecError::Timeout { seconds }),
            ScriptedResponse::NotFound => Err(ExecError::CommandNotFound {
                program: program.to_string(),
            }),
        }
    }
}

/// Test double that records every call instead of touching the OS.
///
/// When built with [`RecordingEnvironment::with_probe`], launches show up
/// as running processes in the probe and terminations remove them.
#[derive(Default)]
pub struct RecordingEnvironment {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<String, ScriptedResponse>>,
    terminate_response: Mutex<Option<ScriptedResponse>>,
    probe: Option<Arc<InMemoryProbe>>,
    next_pid: AtomicU32,
}

impl RecordingEnvironment {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(4000),
            ..Default::default()
        }
    }

    pub fn with_probe(probe: Arc<InMemoryProbe>) -> Self {
        Self {
            probe: Some(probe),
            ..Self::new()
        }
    }

    /// Reply to every future `run` of `program` with `response`.
    pub fn respond(&self, program: &str, response: ScriptedResponse) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(program.to_string(), response);
    }

    /// Reply to every future `terminate` with `response`.
    pub fn respond_terminate(&self, response: ScriptedResponse) {
        *self
            .terminate_response
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Programs passed to `run`, in call order.
    pub fn ran(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Run { program, .. } => Some(program),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl SystemEnvironment for RecordingEnvironment {
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> Pin<Box<dyn Future<Output = ExecResult<CommandOutput>> + Send + '_>> {
        self.record(RecordedCall::Run {
            program: program.to_string(),
            args: args.to_vec(),
        });
        let response = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(program)
            .cloned()
            .unwrap_or_else(|| ScriptedResponse::ok(""));
        let result = response.into_result(program);
        Box::pin(async move { result })
    }

    fn launch(&self, program: &str, args: &[String]) -> ExecResult<u32> {
        self.record(RecordedCall::Launch {
            program: program.to_string(),
            args: args.to_vec(),
        });
        let pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
        if let Some(probe) = &self.probe {
            let mut cmd: Vec<&str> = vec![program];
            cmd.extend(args.iter().map(String::as_str));
            probe.add(pid, program, &cmd);
        }
        Ok(pid)
    }

    fn terminate(&self, pid: u32) -> Pin<Box<dyn Future<Output = ExecResult<()>> + Send + '_>> {
        self.record(RecordedCall::Terminate { pid });
        let response = self
            .terminate_response
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| ScriptedResponse::ok(""));
        let result = match response.into_result("taskkill") {
            Ok(out) if out.success => Ok(()),
            Ok(out) => Err(ExecError::ExecutionFailed {
                message: out.stderr,
            }),
            Err(e) => Err(e),
        };
        if result.is_ok() {
            if let Some(probe) = &self.probe {
                probe.remove(pid);
            }
        }
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdm_detect::ProcessProbe;

    #[tokio::test]
    async fn test_scripted_run() {
        let env = RecordingEnvironment::new();
        env.respond("gsettings", ScriptedResponse::ok("'file:///tmp/a.png'\n"));

        let out = env.run("gsettings", &["get".to_string()]).await.unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "'file:///tmp/a.png'");

        let other = env.run("true", &[]).await.unwrap();
        assert!(other.stdout.is_empty());
        assert_eq!(env.ran(), vec!["gsettings", "true"]);
    }

    #[tokio::test]
    async fn test_scripted_timeout() {
        let env = RecordingEnvironment::new();
        env.respond("notify-send", ScriptedResponse::Timeout { seconds: 2 });
        let err = env.run("notify-send", &[]).await.unwrap_err();
        assert!(matches!(err, ExecError::Timeout { seconds: 2 }));
    }

    #[tokio::test]
    async fn test_launch_and_terminate_update_probe() {
        let probe = Arc::new(InMemoryProbe::new());
        let env = RecordingEnvironment::with_probe(probe.clone());

        let pid = env.launch("gedit", &["/tmp/a.txt".to_string()]).unwrap();
        let found = probe.find(&["gedit"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cmd, vec!["gedit", "/tmp/a.txt"]);

        env.terminate(pid).await.unwrap();
        assert!(!probe.is_running(&["gedit"]));
        assert_eq!(env.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_terminate_timeout_keeps_process() {
        let probe = Arc::new(InMemoryProbe::new());
        let env = RecordingEnvironment::with_probe(probe.clone());
        env.respond_terminate(ScriptedResponse::Timeout { seconds: 10 });

        let pid = env.launch("gedit", &[]).unwrap();
        let err = env.terminate(pid).await.unwrap_err();
        assert!(matches!(err, ExecError::Timeout { seconds: 10 }));
        assert!(probe.is_running(&["gedit"]));
    }
}
