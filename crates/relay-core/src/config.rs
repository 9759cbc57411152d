//! Project configuration for relay.
//!
//! A project opts in by carrying `.relay/relay-config.json`. The file is
//! discovered by walking upward from the working directory; absence at every
//! level means "no configuration" and callers fall back to defaults.
//!
//! The catalog itself lives in the user's home directory
//! (`~/.relay/relay.db`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::editor::Editor;
use crate::error::{Error, Result};

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".relay";

/// Name of the configuration file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "relay-config.json";

/// Default location of new working trees, relative to the repository.
pub const DEFAULT_WORKTREE_BASE: &str = "../worktrees";

/// Default branch new working-tree branches fork from.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Per-project configuration (`.relay/relay-config.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    pub repo_base: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<Editor>,
    #[serde(default = "default_worktree_base")]
    pub worktree_base: String,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    /// Tracker team key (e.g. `ENG`) used when no team is given explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_team: Option<String>,
    /// Shell commands run inside every freshly created working tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub startup_scripts: Vec<String>,
}

fn default_worktree_base() -> String {
    DEFAULT_WORKTREE_BASE.to_string()
}

fn default_base_branch() -> String {
    DEFAULT_BASE_BRANCH.to_string()
}

impl RelayConfig {
    /// A configuration for `repo_base` with every other field defaulted.
    pub fn new(repo_base: impl Into<PathBuf>) -> Self {
        Self {
            repo_base: repo_base.into(),
            editor: None,
            worktree_base: default_worktree_base(),
            base_branch: default_base_branch(),
            default_team: None,
            startup_scripts: Vec::new(),
        }
    }
}

/// Path of the config file for a project directory.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load the config stored directly in `dir`, if any.
pub fn load_config(dir: &Path) -> Result<Option<RelayConfig>> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map(Some).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Write `config` to `dir/.relay/relay-config.json`, creating the directory.
pub fn save_config(config: &RelayConfig, dir: &Path) -> Result<PathBuf> {
    let path = config_path(dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Find the nearest config walking upward from `start` to the filesystem root.
///
/// Returns the directory that holds the config together with the parsed file.
pub fn discover_config(start: &Path) -> Result<Option<(PathBuf, RelayConfig)>> {
    for dir in start.ancestors() {
        if let Some(config) = load_config(dir)? {
            tracing::debug!(dir = %dir.display(), "Found project config");
            return Ok(Some((dir.to_path_buf(), config)));
        }
    }
    Ok(None)
}

/// Directory holding the catalog: `~/.relay/`.
pub fn catalog_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR))
}

/// Default catalog database path: `~/.relay/relay.db`.
pub fn catalog_path() -> Option<PathBuf> {
    catalog_dir().map(|d| d.join("relay.db"))
}
