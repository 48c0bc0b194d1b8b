//! Handler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vdm_exec::ExecutorConfig;

/// Target platform for external commands and process names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

/// Settings shared by all handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    pub platform: Platform,

    /// Upper bound for any external command that is waited on.
    pub exec_timeout_secs: u32,

    /// How long to wait for a launched application to show up.
    pub launch_settle_ms: u64,

    /// Title used for desktop notifications.
    pub notifier_title: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            exec_timeout_secs: 10,
            launch_settle_ms: 1500,
            notifier_title: "vdm".to_string(),
        }
    }
}

impl OpsConfig {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::with_timeout(self.exec_timeout_secs)
    }

    pub fn launch_settle(&self) -> Duration {
        Duration::from_millis(self.launch_settle_ms)
    }
}
