// config.rs — Tool configuration from .afs/config.toml.
//
// Every field has a default, so a missing file, a missing table or a missing
// key all fall back to the values below. Example:
//
//   agent_name = "refactor-bot"
//   audit_log = true
//
//   [write]
//   create_backup = true
//   max_file_size = 10485760
//   validate_syntax = true

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FsToolError;

/// Directory under the project root holding tool configuration.
pub const CONFIG_DIR: &str = ".afs";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Default upper bound on written content: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Gates applied by the atomic writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Copy an existing target to a timestamped sibling before replacing it.
    pub create_backup: bool,

    /// Refuse content larger than this many bytes.
    pub max_file_size: u64,

    /// Parse `.py` content before writing and refuse syntax errors.
    pub validate_syntax: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            create_backup: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            validate_syntax: true,
        }
    }
}

/// Top-level tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Name recorded as `agent_name` on audit events.
    pub agent_name: String,

    /// Attach the JSONL audit log under `<root>/logs/` on initialize.
    pub audit_log: bool,

    /// Write gates.
    pub write: WriteOptions,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            agent_name: "agent".to_string(),
            audit_log: true,
            write: WriteOptions::default(),
        }
    }
}

impl SandboxConfig {
    /// Location of the config file for a project.
    pub fn config_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, FsToolError> {
        let content = std::fs::read_to_string(path).map_err(|e| FsToolError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| FsToolError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the config, or fall back to defaults when the file is absent or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// [`Self::load_or_default`] from the project's standard location.
    pub fn for_project(project_root: &Path) -> Self {
        Self::load_or_default(&Self::config_path(project_root))
    }
}
