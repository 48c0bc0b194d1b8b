//! Loading [`OpsConfig`] for a host-started core.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vdm_ops::OpsConfig;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "VDM_OPS_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Config from `VDM_OPS_CONFIG`, or defaults.
///
/// A file that cannot be read or parsed is logged and ignored.
pub fn load() -> OpsConfig {
    let Some(path) = std::env::var_os(CONFIG_ENV) else {
        return OpsConfig::default();
    };
    match load_from(Path::new(&path)) {
        Ok(config) => {
            debug!(path = ?path, "Loaded ops config");
            config
        }
        Err(e) => {
            warn!(error = %e, "Ignoring ops config, using defaults");
            OpsConfig::default()
        }
    }
}

pub fn load_from(path: &Path) -> Result<OpsConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vdm_ops::Platform;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"platform":"windows","exec_timeout_secs":3}}"#).unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(config.platform, Platform::Windows);
        assert_eq!(config.exec_timeout_secs, 3);
        assert_eq!(config.launch_settle_ms, 1500);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "platform = linux").unwrap();
        assert!(matches!(
            load_from(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_from(&dir.path().join("nope.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
