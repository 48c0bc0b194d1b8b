//! Discovery of running application processes.
//!
//! Abstracted behind a trait so handlers can be tested without a desktop.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// A running process that matched one of the requested names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// Command line, program first.
    pub cmd: Vec<String>,
}

/// Provider for running-process lookups.
pub trait ProcessProbe: Send + Sync {
    /// All running processes whose name is one of `names`.
    fn find(&self, names: &[&str]) -> Vec<ProcessInfo>;

    /// Whether any process with one of `names` is running.
    fn is_running(&self, names: &[&str]) -> bool {
        !self.find(names).is_empty()
    }
}

/// Production probe backed by sysinfo.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SysinfoProbe {
    fn find(&self, names: &[&str]) -> Vec<ProcessInfo> {
        let Ok(mut sys) = self.system.lock() else {
            tracing::warn!("process probe lock poisoned");
            return Vec::new();
        };

        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new().with_cmd(UpdateKind::OnlyIfNotSet),
        );

        let mut found: Vec<ProcessInfo> = sys
            .processes()
            .iter()
            .filter_map(|(pid, process)| {
                let name = process.name().to_string_lossy();
                if !names.iter().any(|n| *n == name) {
                    return None;
                }
                Some(ProcessInfo {
                    pid: pid.as_u32(),
                    name: name.into_owned(),
                    cmd: process
                        .cmd()
                        .iter()
                        .map(|arg| arg.to_string_lossy().into_owned())
                        .collect(),
                })
            })
            .collect();

        found.sort_by_key(|p| p.pid);
        found
    }
}

/// In-memory probe for testing.
///
/// Reports whatever processes were added, until they are removed.
#[derive(Default)]
pub struct InMemoryProbe {
    processes: Mutex<Vec<ProcessInfo>>,
}

impl InMemoryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a process is running.
    pub fn add(&self, pid: u32, name: &str, cmd: &[&str]) {
        self.processes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ProcessInfo {
                pid,
                name: name.to_string(),
                cmd: cmd.iter().map(|s| s.to_string()).collect(),
            });
    }

    /// Forget a process.
    pub fn remove(&self, pid: u32) {
        self.processes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|p| p.pid != pid);
    }

    pub fn clear(&self) {
        self.processes.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl ProcessProbe for InMemoryProbe {
    fn find(&self, names: &[&str]) -> Vec<ProcessInfo> {
        self.processes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|p| names.contains(&p.name.as_str()))
            .cloned()
            .collect()
    }
}

/// Null implementation for testing or unsupported platforms.
pub struct NullProbe;

impl ProcessProbe for NullProbe {
    fn find(&self, _names: &[&str]) -> Vec<ProcessInfo> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_probe_finds_nothing() {
        assert!(NullProbe.find(&["chrome"]).is_empty());
        assert!(!NullProbe.is_running(&["chrome"]));
    }

    #[test]
    fn test_in_memory_probe() {
        let probe = InMemoryProbe::new();
        probe.add(10, "gedit", &["gedit", "/tmp/a.txt"]);
        probe.add(11, "firefox", &["firefox"]);

        let found = probe.find(&["gedit", "gedit.exe"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cmd, vec!["gedit", "/tmp/a.txt"]);

        probe.remove(10);
        assert!(!probe.is_running(&["gedit"]));
        assert!(probe.is_running(&["firefox"]));

        probe.clear();
        assert!(probe.find(&["firefox"]).is_empty());
    }

    #[test]
    fn test_sysinfo_probe_ignores_unknown_names() {
        let probe = SysinfoProbe::new();
        assert!(probe.find(&["definitely-not-a-process-4242"]).is_empty());
        assert!(probe.find(&[]).is_empty());
    }
}
