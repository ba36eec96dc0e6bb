//! Workspace traversal and mount plan assembly.
//!
//! A single pre-order walk of the workspace tree resolves every entry against
//! the overlay policy and emits mount directives:
//!
//! 1. Entries under an already-shadowed ancestor are skipped outright; the
//!    ancestor's single `ShadowDir` directive is authoritative for its whole
//!    subtree.
//! 2. Ignore patterns are checked first and take absolute precedence over
//!    readonly patterns. A matching directory becomes one `ShadowDir` and is
//!    pruned; a matching file becomes one `ShadowFile`.
//! 3. Readonly patterns are checked next. A matching directory becomes one
//!    `ReadOnly` bind of the whole subtree and is pruned, so ignore patterns
//!    are NOT applied to anything inside it. Ignored content inside a
//!    readonly-exposed directory therefore remains visible. This is a
//!    known policy limitation, kept deliberately.
//! 4. Everything else gets no directive: the caller binds the workspace root
//!    read-write, and unmatched entries inherit that access implicitly.
//!
//! The walk is best-effort over a live filesystem: entries that cannot be read
//! (permission errors, races) are skipped silently and the plan sizes down
//! accordingly. Only two failures are fatal - a workspace root that is missing
//! or not a directory, and failure to provision the shadow placeholders.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::overlay::mount::{MountDirective, MountKind, OverlayPolicy};
use crate::overlay::pattern::matches_any;
use crate::overlay::shadow::ShadowPaths;

/// Scans `workspace_root` and produces the unordered mount plan.
///
/// Directives come out in traversal order; callers pass the result through
/// [`crate::overlay::mount::build_mount_list`] before handing it to the
/// container invocation.
pub fn scan(workspace_root: &Path, policy: &OverlayPolicy) -> Result<Vec<MountDirective>> {
    let meta = fs::metadata(workspace_root).with_context(|| {
        format!(
            "cannot access workspace root: {}",
            workspace_root.display()
        )
    })?;
    if !meta.is_dir() {
        anyhow::bail!(
            "workspace root is not a directory: {}",
            workspace_root.display()
        );
    }

    let shadows = ShadowPaths::provision()?;

    let mut directives = Vec::new();
    // Relative-path prefixes (with trailing slash) of directories already
    // resolved to a shadow. Local to this scan by design: concurrent or
    // repeated scans must not see each other's state.
    let mut excluded_prefixes: Vec<String> = Vec::new();

    let mut walker = WalkDir::new(workspace_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            // Unreadable entry: drop it from the plan and keep walking.
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {}", err);
                continue;
            }
        };

        let rel_path = match entry.path().strip_prefix(workspace_root) {
            Ok(rel) => to_forward_slashes(rel),
            Err(_) => continue,
        };
        let is_dir = entry.file_type().is_dir();

        if under_excluded_prefix(&rel_path, &excluded_prefixes) {
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        let name = entry.file_name().to_string_lossy();

        if matches_any(&rel_path, &name, &policy.ignore) {
            if is_dir {
                excluded_prefixes.push(format!("{rel_path}/"));
                directives.push(MountDirective {
                    host_path: shadows.dir.clone(),
                    container_path: container_path(&rel_path),
                    kind: MountKind::ShadowDir,
                });
                walker.skip_current_dir();
            } else {
                directives.push(MountDirective {
                    host_path: shadows.file.clone(),
                    container_path: container_path(&rel_path),
                    kind: MountKind::ShadowFile,
                });
            }
            continue;
        }

        if matches_any(&rel_path, &name, &policy.readonly) {
            directives.push(MountDirective {
                host_path: entry.path().to_path_buf(),
                container_path: container_path(&rel_path),
                kind: MountKind::ReadOnly,
            });
            if is_dir {
                // The whole subtree rides on this one bind; do not descend.
                walker.skip_current_dir();
            }
        }
    }

    Ok(directives)
}

/// Maps a workspace-relative path to its container target path.
fn container_path(rel_path: &str) -> String {
    format!("/workspace/{rel_path}")
}

/// Renders a relative path with forward-slash separators regardless of host
/// convention.
fn to_forward_slashes(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn under_excluded_prefix(rel_path: &str, excluded_prefixes: &[String]) -> bool {
    excluded_prefixes
        .iter()
        .any(|prefix| rel_path.starts_with(prefix.as_str()))
}
