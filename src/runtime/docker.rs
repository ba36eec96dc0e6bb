//! Docker invocation assembly.
//!
//! Translates the overlay-mount plan plus configuration into the final
//! `docker run` argument vector and hands the process over to Docker. The
//! workspace root is always bound read-write first; the planner's ordered
//! overlay binds are applied on top of it, so the overlay relies on Docker's
//! later-bind-wins resolution at overlapping targets.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::AgentConfig;
use crate::overlay::MountDirective;

/// Name of the container image built from the support repo.
pub const IMAGE_NAME: &str = "acage";

/// Named volume persisting the agent's home directory across runs.
pub const HOME_VOLUME: &str = "acage-home";

/// Where the in-container firewall script expects the allowed-domains list.
const DOMAINS_MOUNT_TARGET: &str = "/usr/local/etc/domains.txt";

/// Detects whether the Docker daemon offers the sysbox runtime.
///
/// Sysbox enables Docker-in-Docker inside the container without privileged
/// mode. Linux only; anywhere else this is always false.
pub async fn has_sysbox() -> bool {
    if !cfg!(target_os = "linux") {
        return false;
    }
    match tokio::process::Command::new("docker")
        .arg("info")
        .output()
        .await
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains("sysbox-runc"),
        Err(_) => false,
    }
}

/// Writes the merged domains list to a temp file, one domain per line.
///
/// The file is kept on disk rather than cleaned up: the process image is
/// replaced by `exec`, so a drop-based delete would fire before Docker ever
/// reads the file or not at all.
///
/// # Errors
///
/// An empty list is an error: the in-container firewall denies everything
/// without at least one allowed domain, which is never what the user wants.
pub fn write_domains_file(domains: &[String]) -> Result<PathBuf> {
    if domains.is_empty() {
        anyhow::bail!(
            "domains list is empty - add domains to ~/.acage/config.yaml"
        );
    }

    let mut file = tempfile::Builder::new()
        .prefix("acage-domains-")
        .tempfile()
        .context("failed to create domains temp file")?;
    for domain in domains {
        writeln!(file, "{domain}").context("failed to write domains temp file")?;
    }

    let (_, path) = file.keep().context("failed to persist domains temp file")?;
    Ok(path)
}

/// Builds the complete `docker run` argument vector.
///
/// Layout, in order: base flags, optional sysbox runtime, capability
/// adjustments, the read-write workspace root bind, the ordered overlay
/// binds, the home volume, the domains file, config extra args, the image
/// name, and the passthrough command.
pub fn build_run_args(
    workspace_dir: &Path,
    mounts: &[MountDirective],
    config: &AgentConfig,
    domains_file: &Path,
    sysbox: bool,
    passthrough: &[String],
) -> Vec<String> {
    let mut args: Vec<String> = vec!["run".into(), "-it".into(), "--rm".into()];

    if sysbox {
        args.push("--runtime=sysbox-runc".into());
        args.push("-e".into());
        args.push("ACAGE_DIND=1".into());
    }

    args.extend([
        "--cap-drop=SETPCAP".into(),
        "--cap-drop=SETFCAP".into(),
        "--cap-add=NET_ADMIN".into(),
        "--cap-add=NET_RAW".into(),
        "-v".into(),
        format!("{}:/workspace", workspace_dir.display()),
    ]);

    // Overlay binds, already ordered readonly-first by the planner.
    for mount in mounts {
        args.push("-v".into());
        args.push(mount.to_bind_spec());
    }

    args.push("-v".into());
    args.push(format!("{HOME_VOLUME}:/home/acage"));

    args.push("-v".into());
    args.push(format!("{}:{}:ro", domains_file.display(), DOMAINS_MOUNT_TARGET));

    args.extend(config.extra_args.iter().cloned());

    args.push(IMAGE_NAME.into());
    args.extend(passthrough.iter().cloned());

    args
}

/// Replaces the current process image with `docker run …`.
///
/// On success this function never returns; the tokio runtime, shadow
/// placeholders and temp files are all discarded along with the address
/// space, which is why nothing in this crate registers cleanup-on-exit.
pub fn exec_docker(args: &[String]) -> Result<()> {
    tracing::debug!("exec docker {}", args.join(" "));

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let err = std::process::Command::new("docker").args(args).exec();
        // exec only returns on failure
        Err(err).context("failed to exec docker")
    }

    #[cfg(not(unix))]
    {
        anyhow::bail!("acage requires a Unix host to exec docker");
    }
}
