//! Bootstrap and maintenance of the support checkout and container image.
//!
//! The container image (Dockerfile, firewall script, default config) lives in
//! a support repository cloned to `~/.acage/src`. This module clones it on
//! first run, keeps it up to date against the GitHub commits API, builds the
//! image when it is missing, and implements the interactive `--reset` flow.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::config::acage_home_dir;
use crate::runtime::docker::{HOME_VOLUME, IMAGE_NAME};

const REPO_URL: &str = "https://github.com/acage-run/acage.git";
const API_URL: &str = "https://api.github.com/repos/acage-run/acage/commits/main";

/// Returns `~/.acage`, creating it if necessary.
pub fn acage_home() -> Result<PathBuf> {
    let dir = acage_home_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    Ok(dir)
}

/// Clones the support repo to `~/.acage/src` if not already present.
///
/// Records the cloned commit SHA in `<src>/.commit` so later update checks
/// can compare against the remote without shelling out to git.
pub async fn ensure_repo() -> Result<PathBuf> {
    let home = acage_home()?;
    let src_dir = home.join("src");

    if src_dir.join(".git").exists() {
        return Ok(src_dir);
    }

    tracing::info!("cloning support repo to {}", src_dir.display());
    let status = Command::new("git")
        .arg("clone")
        .arg(REPO_URL)
        .arg(&src_dir)
        .status()
        .await
        .context("failed to run git clone")?;
    if !status.success() {
        anyhow::bail!("git clone exited with {status}");
    }

    write_commit(&src_dir).await?;
    tracing::info!(
        "repo cloned - edit {} to customize",
        home.join("config.yaml").display()
    );
    Ok(src_dir)
}

/// Writes `~/.acage/config.yaml` from the repo's default template unless a
/// config already exists. Never overwrites; safe to call every run.
pub fn write_default_config(home_dir: &Path) -> Result<()> {
    let dest = home_dir.join("config.yaml");
    if dest.exists() {
        return Ok(());
    }
    let src = home_dir.join("src").join("config-default.yaml");
    let data = fs::read(&src)
        .with_context(|| format!("failed to read default config: {}", src.display()))?;
    fs::write(&dest, data)
        .with_context(|| format!("failed to write {}", dest.display()))
}

/// Compares the local checkout against the remote head and updates if they
/// differ. A dirty checkout is backed up first so local edits survive the
/// fast-forward pull.
pub async fn check_and_update(repo_dir: &Path) -> Result<()> {
    let remote = remote_commit().await?;
    let local = local_commit(repo_dir)?;
    if remote == local {
        return Ok(());
    }

    if is_dirty(repo_dir).await? {
        backup_src(repo_dir)?;
    }

    tracing::info!("updating to {}", &remote[..7.min(remote.len())]);
    update(repo_dir).await?;
    build_image(repo_dir).await
}

/// Reads the SHA recorded in `<repo_dir>/.commit`.
fn local_commit(repo_dir: &Path) -> Result<String> {
    let data = fs::read_to_string(repo_dir.join(".commit"))
        .context("failed to read local commit marker")?;
    Ok(data.trim().to_string())
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
}

/// Fetches the latest commit SHA on `main` from the GitHub API.
async fn remote_commit() -> Result<String> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("acage/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(API_URL)
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .await
        .context("failed to fetch remote commit")?;

    if !response.status().is_success() {
        anyhow::bail!("github api returned {}", response.status());
    }

    let body = response
        .text()
        .await
        .context("failed to read commits API response")?;
    let commit: CommitResponse =
        serde_json::from_str(&body).context("failed to decode commits API response")?;
    Ok(commit.sha)
}

/// Fast-forward pulls the checkout and refreshes the commit marker.
async fn update(repo_dir: &Path) -> Result<()> {
    let status = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(["pull", "--ff-only"])
        .status()
        .await
        .context("failed to run git pull")?;
    if !status.success() {
        anyhow::bail!("git pull exited with {status}");
    }
    write_commit(repo_dir).await
}

/// Builds the container image if it does not exist locally.
pub async fn ensure_image(repo_dir: &Path) -> Result<()> {
    let output = Command::new("docker")
        .args(["images", "-q", IMAGE_NAME])
        .output()
        .await
        .context("failed to check docker image")?;
    if !String::from_utf8_lossy(&output.stdout).trim().is_empty() {
        return Ok(());
    }
    build_image(repo_dir).await
}

async fn build_image(repo_dir: &Path) -> Result<()> {
    tracing::info!("building container image (this may take a few minutes)");
    let status = Command::new("docker")
        .args(["build", "-t", IMAGE_NAME])
        .arg(repo_dir)
        .status()
        .await
        .context("failed to run docker build")?;
    if !status.success() {
        anyhow::bail!("docker build exited with {status}");
    }
    tracing::info!("image built successfully");
    Ok(())
}

async fn write_commit(repo_dir: &Path) -> Result<()> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(["rev-parse", "HEAD"])
        .output()
        .await
        .context("failed to resolve commit sha")?;
    if !output.status.success() {
        anyhow::bail!("git rev-parse exited with {}", output.status);
    }
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    fs::write(repo_dir.join(".commit"), format!("{sha}\n"))
        .context("failed to write commit marker")
}

/// True if the checkout has uncommitted changes.
async fn is_dirty(repo_dir: &Path) -> Result<bool> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(["status", "--porcelain"])
        .output()
        .await
        .context("failed to run git status")?;
    if !output.status.success() {
        anyhow::bail!("git status exited with {}", output.status);
    }
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Copies the checkout to a timestamped `.bak` sibling directory.
fn backup_src(src_dir: &Path) -> Result<()> {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = PathBuf::from(format!("{}.{}.bak", src_dir.display(), timestamp));
    copy_tree(src_dir, &dest)?;
    tracing::info!("backed up {} to {}", src_dir.display(), dest.display());
    Ok(())
}

/// Recursively copies `src` into `dest`, preserving structure.
fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.context("failed to walk backup source")?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .context("backup entry outside source tree")?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

/// Which pieces of persisted state a reset removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPlan {
    pub containers: bool,
    pub image: bool,
    pub volume: bool,
    pub directory: bool,
}

impl ResetPlan {
    /// Parses a component code string: `c` containers, `i` image, `v` home
    /// volume, `d` `~/.acage`. Empty string selects everything.
    pub fn parse(components: &str) -> Result<Self> {
        for ch in components.chars() {
            if !"civd".contains(ch) {
                anyhow::bail!(
                    "unknown reset component {:?} (valid: c=containers, i=image, v=volume, d=directory)",
                    ch
                );
            }
        }
        let all = components.is_empty();
        Ok(Self {
            containers: all || components.contains('c'),
            image: all || components.contains('i'),
            volume: all || components.contains('v'),
            directory: all || components.contains('d'),
        })
    }
}

/// Removes selected persisted state after an interactive confirmation.
///
/// Workspace `.acage.yaml` files are never touched.
pub async fn reset(components: &str) -> Result<()> {
    let plan = ResetPlan::parse(components)?;

    eprintln!("This will remove:");
    if plan.containers {
        eprintln!("  c - all running acage containers");
    }
    if plan.image {
        eprintln!("  i - the acage Docker image");
    }
    if plan.volume {
        eprintln!("  v - the {HOME_VOLUME} volume");
    }
    if plan.directory {
        eprintln!("  d - ~/.acage");
    }
    eprint!("\nWorkspace .acage.yaml files are not affected.\n\nContinue? [y/N] ");
    std::io::stderr().flush().ok();

    let mut response = String::new();
    std::io::stdin()
        .read_line(&mut response)
        .context("failed to read confirmation")?;
    if !matches!(response.trim(), "y" | "Y") {
        eprintln!("Aborted.");
        return Ok(());
    }

    if plan.containers {
        let output = Command::new("docker")
            .args(["ps", "-q", "--filter"])
            .arg(format!("ancestor={IMAGE_NAME}"))
            .output()
            .await
            .context("failed to list containers")?;
        for id in String::from_utf8_lossy(&output.stdout).split_whitespace() {
            let status = Command::new("docker")
                .args(["rm", "-f", id])
                .status()
                .await
                .with_context(|| format!("failed to remove container {id}"))?;
            if !status.success() {
                anyhow::bail!("docker rm {id} exited with {status}");
            }
        }
    }

    if plan.image {
        // May not exist; ignore failure
        Command::new("docker")
            .args(["rmi", IMAGE_NAME])
            .status()
            .await
            .ok();
    }

    if plan.volume {
        // May not exist; ignore failure
        Command::new("docker")
            .args(["volume", "rm", HOME_VOLUME])
            .status()
            .await
            .ok();
    }

    if plan.directory {
        let dir = acage_home_dir()?;
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to remove {}", dir.display()))?;
        }
    }

    eprintln!("Reset complete. Run acage again to start fresh.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reset_plan_empty_selects_everything() {
        let plan = ResetPlan::parse("").unwrap();
        assert!(plan.containers && plan.image && plan.volume && plan.directory);
    }

    #[test]
    fn reset_plan_selects_named_components_only() {
        let plan = ResetPlan::parse("ci").unwrap();
        assert!(plan.containers);
        assert!(plan.image);
        assert!(!plan.volume);
        assert!(!plan.directory);
    }

    #[test]
    fn reset_plan_rejects_unknown_codes() {
        let err = ResetPlan::parse("cx").unwrap_err();
        assert!(err.to_string().contains("unknown reset component"));
    }

    #[test]
    fn copy_tree_preserves_structure() {
        let src = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("a/b")).unwrap();
        fs::write(src.path().join("a/b/file.txt"), "hello").unwrap();
        fs::write(src.path().join("top.txt"), "top").unwrap();

        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("backup");
        copy_tree(src.path(), &dest_root).unwrap();

        assert_eq!(
            fs::read_to_string(dest_root.join("a/b/file.txt")).unwrap(),
            "hello"
        );
        assert_eq!(fs::read_to_string(dest_root.join("top.txt")).unwrap(), "top");
    }

    #[test]
    fn write_default_config_never_overwrites() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join("src")).unwrap();
        fs::write(home.path().join("src/config-default.yaml"), "domains: []\n").unwrap();
        fs::write(home.path().join("config.yaml"), "domains:\n  - custom\n").unwrap();

        write_default_config(home.path()).unwrap();
        let content = fs::read_to_string(home.path().join("config.yaml")).unwrap();
        assert!(content.contains("custom"));
    }

    #[test]
    fn write_default_config_copies_template_when_absent() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join("src")).unwrap();
        fs::write(
            home.path().join("src/config-default.yaml"),
            "domains:\n  - github.com\n",
        )
        .unwrap();

        write_default_config(home.path()).unwrap();
        let content = fs::read_to_string(home.path().join("config.yaml")).unwrap();
        assert!(content.contains("github.com"));
    }

    #[test]
    fn local_commit_trims_trailing_newline() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join(".commit"), "abc123\n").unwrap();
        assert_eq!(local_commit(repo.path()).unwrap(), "abc123");
    }
}
