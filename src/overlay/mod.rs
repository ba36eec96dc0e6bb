//! Workspace overlay-mount planner.
//!
//! The planner decides how the host workspace appears inside the container.
//! The workspace root itself is bound read-write by the invocation layer;
//! this module computes the overlay applied on top of that bind:
//!
//! - entries matching an **ignore** pattern are shadowed behind shared empty
//!   placeholders (the path exists in the container but is inert and empty);
//! - entries matching a **readonly** pattern are bound from their real host
//!   path, read-only;
//! - everything else is left alone and inherits read-write access.
//!
//! The planner only computes a list of [`mount::MountDirective`] values; it
//! performs no mount operation itself. [`plan_workspace_overlay`] is the
//! one-call entry point producing the final ordered list.

pub mod mount;
pub mod pattern;
pub mod scanner;
pub mod shadow;

pub use mount::{build_mount_list, MountDirective, MountKind, OverlayPolicy};

use std::path::Path;

use anyhow::Result;

/// Scans the workspace and returns the ordered overlay-mount plan.
pub fn plan_workspace_overlay(
    workspace_root: &Path,
    policy: &OverlayPolicy,
) -> Result<Vec<MountDirective>> {
    let directives = scanner::scan(workspace_root, policy)?;
    Ok(build_mount_list(directives))
}
