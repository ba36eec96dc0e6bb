//! Configuration loading and merging.
//!
//! Policy comes from up to two YAML files: the user-level
//! `~/.acage/config.yaml` and the workspace-level `<workspace>/.acage.yaml`.
//! Workspace lists are appended to the user lists, so a project can extend
//! the user's baseline but never remove from it. Missing files are fine;
//! unreadable or unparsable files are errors.
//!
//! Glob patterns in `ignore`/`readonly` are deliberately not validated here.
//! A malformed pattern degrades to "never matches" at evaluation time; see
//! [`crate::overlay::pattern`].

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::overlay::OverlayPolicy;

/// Name of the per-workspace config file.
pub const WORKSPACE_CONFIG_FILE: &str = ".acage.yaml";

/// Merged agent configuration.
///
/// All lists default to empty, so either config file may supply any subset of
/// fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Glob patterns for paths hidden behind empty placeholders.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Glob patterns for paths exposed read-only.
    #[serde(default)]
    pub readonly: Vec<String>,

    /// Extra arguments appended verbatim to `docker run`.
    ///
    /// Leading `~` and `$HOME` are expanded to the real home directory.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Domains the in-container firewall allows outbound traffic to.
    #[serde(default)]
    pub domains: Vec<String>,
}

impl AgentConfig {
    /// Parses a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse YAML configuration")
    }

    /// Loads a configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("in config file: {}", path.display()))
    }

    /// Appends another configuration's lists to this one.
    pub fn merge(&mut self, other: AgentConfig) {
        self.ignore.extend(other.ignore);
        self.readonly.extend(other.readonly);
        self.extra_args.extend(other.extra_args);
        self.domains.extend(other.domains);
    }

    /// Extracts the pattern sets the overlay planner consumes.
    pub fn overlay_policy(&self) -> OverlayPolicy {
        OverlayPolicy::new(self.ignore.clone(), self.readonly.clone())
    }
}

/// Loads and merges the user and workspace configurations.
///
/// Either file may be absent; a present file that cannot be read or parsed is
/// an error, never silently skipped.
pub fn load_config(workspace_dir: &Path) -> Result<AgentConfig> {
    let user_path = acage_home_dir()?.join("config.yaml");
    let workspace_path = workspace_dir.join(WORKSPACE_CONFIG_FILE);

    let mut config = match read_optional(&user_path)? {
        Some(cfg) => cfg,
        None => AgentConfig::default(),
    };

    if let Some(workspace_cfg) = read_optional(&workspace_path)? {
        config.merge(workspace_cfg);
    }

    expand_home_args(&mut config.extra_args);
    Ok(config)
}

/// Returns `~/.acage` without creating it.
pub fn acage_home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".acage"))
        .ok_or_else(|| anyhow!("could not determine home directory"))
}

fn read_optional(path: &Path) -> Result<Option<AgentConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    AgentConfig::from_file(path).map(Some)
}

/// Expands `~`, `~/…`, `$HOME` and `$HOME/…` in extra docker arguments.
fn expand_home_args(args: &mut [String]) {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    for arg in args.iter_mut() {
        if arg == "~" || arg == "$HOME" {
            *arg = home.to_string_lossy().into_owned();
        } else if let Some(rest) = arg.strip_prefix("~/") {
            *arg = home.join(rest).to_string_lossy().into_owned();
        } else if let Some(rest) = arg.strip_prefix("$HOME/") {
            *arg = home.join(rest).to_string_lossy().into_owned();
        }
    }
}
