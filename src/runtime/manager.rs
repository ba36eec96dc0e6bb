//! End-to-end run orchestration.
//!
//! The [`RuntimeManager`] drives one invocation from bootstrap to handoff:
//!
//! 1. Ensure the support repo is cloned and the default config written
//! 2. Optionally check for updates (failures warn, never abort)
//! 3. Ensure the container image exists
//! 4. Load and merge configuration for the current workspace
//! 5. Plan the workspace overlay mounts
//! 6. Assemble the `docker run` invocation and exec into it
//!
//! The final step replaces this process's image, so on success `run` never
//! returns.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::load_config;
use crate::overlay::plan_workspace_overlay;
use crate::runtime::docker::{build_run_args, exec_docker, has_sysbox, write_domains_file};
use crate::setup;

/// Orchestrates a single sandboxed agent run.
pub struct RuntimeManager {
    /// Skip the remote update check.
    no_update: bool,
}

impl RuntimeManager {
    pub fn new(no_update: bool) -> Self {
        Self { no_update }
    }

    /// Runs the full pipeline and execs into `docker run`.
    ///
    /// `passthrough` is forwarded verbatim as the container command.
    pub async fn run(&self, passthrough: &[String]) -> Result<()> {
        let repo_dir = setup::ensure_repo().await?;

        // Must come after ensure_repo: the template lives in the checkout.
        let home = setup::acage_home()?;
        setup::write_default_config(&home)?;

        if self.no_update {
            tracing::debug!("update check skipped");
        } else if let Err(err) = setup::check_and_update(&repo_dir).await {
            tracing::warn!("update check failed: {err:#}");
        }

        setup::ensure_image(&repo_dir).await?;

        let workspace_dir = current_workspace()?;
        let config = load_config(&workspace_dir)?;

        let mounts = plan_workspace_overlay(&workspace_dir, &config.overlay_policy())?;
        tracing::debug!("planned {} overlay mounts", mounts.len());

        let domains_file = write_domains_file(&config.domains)?;
        let sysbox = has_sysbox().await;

        let args = build_run_args(
            &workspace_dir,
            &mounts,
            &config,
            &domains_file,
            sysbox,
            passthrough,
        );
        exec_docker(&args)
    }
}

fn current_workspace() -> Result<PathBuf> {
    std::env::current_dir().context("failed to get working directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_records_update_preference() {
        let manager = RuntimeManager::new(true);
        assert!(manager.no_update);
        let manager = RuntimeManager::new(false);
        assert!(!manager.no_update);
    }

    #[test]
    fn current_workspace_resolves() {
        assert!(current_workspace().is_ok());
    }
}
