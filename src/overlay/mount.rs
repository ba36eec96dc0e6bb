//! Mount directive data model and final plan ordering.
//!
//! A [`MountDirective`] is one host-to-container bind instruction. The scanner
//! emits directives in traversal order; [`build_mount_list`] produces the
//! sequence actually handed to the container invocation, with a hard ordering
//! guarantee: every read-only exposure comes before every shadow placeholder.
//!
//! Docker resolves overlapping bind targets in application order, with later
//! binds winning at their target path. Putting shadows last means that if a
//! policy change ever produces a shadow whose container path nests inside a
//! read-only exposure, the exclusion still wins. Today's pruning rules never
//! produce such an overlap; the ordering is kept as an explicit, tested
//! contract anyway.

use std::path::PathBuf;

/// How a host path is exposed inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    /// The real host path, bound read-only.
    ReadOnly,
    /// The shared empty placeholder file, hiding a host file.
    ShadowFile,
    /// The shared empty placeholder directory, hiding a host subtree.
    ShadowDir,
}

impl MountKind {
    /// True for both shadow variants.
    pub fn is_shadow(self) -> bool {
        matches!(self, MountKind::ShadowFile | MountKind::ShadowDir)
    }
}

/// One host-to-container bind instruction.
///
/// `container_path` is always `/workspace/<relative path>` with forward-slash
/// separators, regardless of host convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountDirective {
    /// Source path on the host (real path, or a shadow placeholder).
    pub host_path: PathBuf,
    /// Target path inside the container.
    pub container_path: String,
    /// Exposure mode.
    pub kind: MountKind,
}

impl MountDirective {
    /// Renders the directive as a `docker run -v` bind specification.
    ///
    /// Every directive is bound read-only on the container side: read-only
    /// exposures because the policy demands it, shadows because the
    /// placeholder itself is immutable and carries no information.
    pub fn to_bind_spec(&self) -> String {
        format!(
            "{}:{}:ro",
            self.host_path.display(),
            self.container_path
        )
    }
}

/// The ignore/readonly pattern sets governing workspace exposure.
///
/// Both lists hold plain glob strings. A pattern containing `/` is matched
/// against the full workspace-relative path; a pattern without one is matched
/// against the entry's base name only. Ignore patterns take absolute
/// precedence over readonly patterns.
///
/// Constructed once per invocation from the merged configuration and immutable
/// thereafter.
#[derive(Debug, Clone, Default)]
pub struct OverlayPolicy {
    /// Patterns whose matches are hidden behind empty placeholders.
    pub ignore: Vec<String>,
    /// Patterns whose matches are exposed read-only.
    pub readonly: Vec<String>,
}

impl OverlayPolicy {
    pub fn new(ignore: Vec<String>, readonly: Vec<String>) -> Self {
        Self { ignore, readonly }
    }
}

/// Orders a directive list for handoff to the container invocation.
///
/// All `ReadOnly` directives precede all `Shadow*` directives; relative order
/// within each group is preserved. No overlap detection or deduplication is
/// attempted.
pub fn build_mount_list(directives: Vec<MountDirective>) -> Vec<MountDirective> {
    let (mut readonly, shadows): (Vec<_>, Vec<_>) = directives
        .into_iter()
        .partition(|d| d.kind == MountKind::ReadOnly);
    readonly.extend(shadows);
    readonly
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(container_path: &str, kind: MountKind) -> MountDirective {
        MountDirective {
            host_path: PathBuf::from("/host").join(container_path.trim_start_matches('/')),
            container_path: container_path.to_string(),
            kind,
        }
    }

    #[test]
    fn readonly_precedes_all_shadows() {
        let plan = build_mount_list(vec![
            directive("/workspace/.git", MountKind::ShadowDir),
            directive("/workspace/vendor", MountKind::ReadOnly),
            directive("/workspace/secrets.env", MountKind::ShadowFile),
            directive("/workspace/Cargo.lock", MountKind::ReadOnly),
        ]);

        let last_readonly = plan
            .iter()
            .rposition(|d| d.kind == MountKind::ReadOnly)
            .unwrap();
        let first_shadow = plan.iter().position(|d| d.kind.is_shadow()).unwrap();
        assert!(last_readonly < first_shadow);
    }

    #[test]
    fn relative_order_within_groups_is_preserved() {
        let plan = build_mount_list(vec![
            directive("/workspace/a", MountKind::ShadowDir),
            directive("/workspace/b", MountKind::ReadOnly),
            directive("/workspace/c", MountKind::ShadowFile),
            directive("/workspace/d", MountKind::ReadOnly),
        ]);

        let paths: Vec<&str> = plan.iter().map(|d| d.container_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/workspace/b",
                "/workspace/d",
                "/workspace/a",
                "/workspace/c"
            ]
        );
    }

    #[test]
    fn empty_list_stays_empty() {
        assert!(build_mount_list(vec![]).is_empty());
    }

    #[test]
    fn bind_spec_is_always_read_only() {
        let ro = directive("/workspace/vendor", MountKind::ReadOnly);
        assert_eq!(ro.to_bind_spec(), "/host/workspace/vendor:/workspace/vendor:ro");

        let shadow = directive("/workspace/.git", MountKind::ShadowDir);
        assert!(shadow.to_bind_spec().ends_with(":ro"));
    }

    #[test]
    fn shadow_kinds_report_as_shadow() {
        assert!(MountKind::ShadowFile.is_shadow());
        assert!(MountKind::ShadowDir.is_shadow());
        assert!(!MountKind::ReadOnly.is_shadow());
    }
}
