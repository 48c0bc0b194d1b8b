//! Command executor for application handlers.
//!
//! Executes commands as program + args (no shell) with:
//! - Timeout handling
//! - Output truncation
//! - Process tree cleanup (kill_tree)
//! - Detached launches for GUI applications

use crate::error::{ExecError, ExecResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;
#[cfg(not(unix))]
use tracing::warn;

/// Pause between the polite and the forced kill.
const KILL_GRACE: Duration = Duration::from_millis(100);

/// Limits applied to every command run through this crate.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Seconds before a waited-on command is killed.
    pub timeout_secs: u32,

    /// Bytes kept per output stream.
    pub max_output: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_output: 4096,
        }
    }
}

impl ExecutorConfig {
    pub fn with_timeout(timeout_secs: u32) -> Self {
        Self {
            timeout_secs,
            ..Default::default()
        }
    }
}

/// Output from command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command succeeded (exit code 0).
    pub success: bool,

    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,

    pub stdout: String,
    pub stderr: String,

    /// Whether either stream was truncated.
    pub truncated: bool,

    /// Execution duration in milliseconds.
    pub duration_ms: u64,

    pub pid: Option<u32>,
}

/// Kill a process and all its children.
///
/// On Unix, this sends SIGTERM to the process group, then SIGKILL if needed.
#[cfg(unix)]
pub async fn kill_tree(pid: u32) {
    debug!(pid, "Killing process tree");

    let pgid = pid as libc::pid_t;
    // SAFETY: killpg only sends a signal; an invalid group just returns ESRCH.
    unsafe {
        libc::killpg(pgid, libc::SIGTERM);
    }

    tokio::time::sleep(KILL_GRACE).await;

    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }

    debug!(pid, "Process tree killed");
}

#[cfg(not(unix))]
pub async fn kill_tree(pid: u32) {
    debug!(pid, "Killing process tree (taskkill)");
    let mut cmd = Command::new("taskkill");
    cmd.args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    match cmd.spawn() {
        Ok(mut child) => {
            if timeout(KILL_GRACE * 50, child.wait()).await.is_err() {
                warn!(pid, "taskkill did not finish in time");
            }
        }
        Err(e) => warn!(pid, error = %e, "Failed to run taskkill"),
    }
}

/// Ask a single process to exit.
///
/// On Unix this is a SIGTERM. Elsewhere `taskkill` runs through
/// [`execute_command`], so it is bounded by `config.timeout_secs`.
#[cfg(unix)]
pub async fn terminate(pid: u32, _config: &ExecutorConfig) -> ExecResult<()> {
    debug!(pid, "Terminating process");
    // SAFETY: kill only sends a signal.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(ExecError::ExecutionFailed {
            message: format!(
                "failed to terminate {pid}: {}",
                std::io::Error::last_os_error()
            ),
        })
    }
}

#[cfg(not(unix))]
pub async fn terminate(pid: u32, config: &ExecutorConfig) -> ExecResult<()> {
    debug!(pid, "Terminating process");
    let args = ["/PID".to_string(), pid.to_string()];
    let output = execute_command("taskkill", &args, config).await?;
    if output.success {
        Ok(())
    } else {
        Err(ExecError::ExecutionFailed {
            message: format!("failed to terminate {pid}: {}", output.stderr),
        })
    }
}

/// Put the child in its own process group so kill_tree reaches its children
/// and host signals do not reach it.
#[cfg(unix)]
fn configure_process_group(cmd: &mut Command) {
    // SAFETY: setpgid is async-signal-safe.
    unsafe {
        cmd.pre_exec(|| {
            libc::setpgid(0, 0);
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn configure_process_group(_cmd: &mut Command) {}

fn build_command(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    configure_process_group(&mut cmd);
    cmd
}

/// Execute a command and wait for it, bounded by `config.timeout_secs`.
pub async fn execute_command(
    program: &str,
    args: &[String],
    config: &ExecutorConfig,
) -> ExecResult<CommandOutput> {
    let start = std::time::Instant::now();

    let mut cmd = build_command(program, args);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| ExecError::from_spawn(program, e))?;

    let pid = child.id();
    debug!(pid = ?pid, program, "Process spawned");

    let timeout_duration = Duration::from_secs(config.timeout_secs as u64);
    let limit = config.max_output;

    let result = timeout(timeout_duration, async {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr) = tokio::join!(read_capped(stdout, limit), read_capped(stderr, limit));
        let status = child.wait().await;
        (stdout, stderr, status)
    })
    .await;

    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(((stdout, out_truncated), (stderr, err_truncated), status)) => {
            let status = status.map_err(|e| ExecError::ExecutionFailed {
                message: e.to_string(),
            })?;

            Ok(CommandOutput {
                success: status.success(),
                exit_code: status.code().unwrap_or(-1),
                stdout,
                stderr,
                truncated: out_truncated || err_truncated,
                duration_ms,
                pid,
            })
        }
        Err(_) => {
            if let Some(pid) = child.id() {
                debug!(pid, "Timeout reached, killing process tree");
                kill_tree(pid).await;
            }
            let _ = child.kill().await;
            Err(ExecError::Timeout {
                seconds: config.timeout_secs,
            })
        }
    }
}

/// Launch a long-running program without waiting for it.
///
/// Only the spawn itself is awaited; the child keeps running after the
/// handle is dropped. Returns the child's pid.
pub fn spawn_detached(program: &str, args: &[String]) -> ExecResult<u32> {
    let mut cmd = build_command(program, args);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let child = cmd
        .spawn()
        .map_err(|e| ExecError::from_spawn(program, e))?;

    let pid = child.id().ok_or_else(|| ExecError::ExecutionFailed {
        message: format!("{program} exited before reporting a pid"),
    })?;
    debug!(pid, program, "Detached process launched");
    Ok(pid)
}

async fn read_capped<R>(stream: Option<R>, limit: usize) -> (String, bool)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(mut stream) = stream else {
        return (String::new(), false);
    };

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let mut truncated = false;

    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buf.len());
                if n > room {
                    truncated = true;
                }
                // Keep draining so the child never blocks on a full pipe
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }

    (String::from_utf8_lossy(&buf).trim_end().to_string(), truncated)
}
