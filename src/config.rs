//! Server configuration.
//!
//! Loaded from `basalt.toml` in the working directory (or an explicit path);
//! every field has a default so a missing file means a default configuration.
//!
//! ```toml
//! socket_path = "/tmp/basalt.sock"
//! data_dir = "./database"
//! metrics_enabled = true
//! ```

use crate::error::{BasaltError, BasaltResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Unix-domain socket the server listens on.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/basalt.sock";

/// Default on-disk location of the catalog and column files.
pub const DEFAULT_DATA_DIR: &str = "./database";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Unix-domain socket path the server binds to.
    pub socket_path: PathBuf,

    /// Directory holding `database.bin`, column data and index dumps.
    pub data_dir: PathBuf,

    /// Whether query metrics are flushed to `<data_dir>/metrics/`.
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// ## Input
    /// - `path`: Explicit config path, or `None` to probe `./basalt.toml`
    ///
    /// ## Output
    /// - `Ok(ServerConfig)`: Parsed config, or defaults if no file exists
    /// - `Err(BasaltError)`: File exists but cannot be read or parsed
    pub fn load(path: Option<&Path>) -> BasaltResult<Self> {
        let probe = PathBuf::from("basalt.toml");
        let path = match path {
            Some(p) => p,
            None if probe.exists() => probe.as_path(),
            None => return Ok(Self::default()),
        };

        let text = std::fs::read_to_string(path).map_err(|e| BasaltError::IoError {
            operation: "read_config".to_string(),
            reason: e.to_string(),
        })?;

        toml::from_str(&text).map_err(|e| BasaltError::IncorrectFileFormat {
            reason: format!("config '{}': {}", path.display(), e),
        })
    }
}
