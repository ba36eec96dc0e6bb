//! Shadow placeholder provisioning.
//!
//! Every excluded entry in the plan is backed by one of two shared inert
//! objects: a zero-byte read-only file and an empty read/execute-only
//! directory. Provisioning them once per scan avoids a throwaway object per
//! exclusion and guarantees the placeholders carry no information and cannot
//! be written into through the bind.
//!
//! The placeholders are intentionally never removed here. The process image is
//! replaced by `exec` at the end of the run, so drop-based cleanup would never
//! fire anyway; reclaiming the temp directory is left to the operating system.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tempfile::Builder;

/// Host paths of the two shared shadow placeholders.
#[derive(Debug, Clone)]
pub struct ShadowPaths {
    /// Zero-byte read-only file, the source for every `ShadowFile` bind.
    pub file: PathBuf,
    /// Empty read/execute-only directory, the source for every `ShadowDir` bind.
    pub dir: PathBuf,
}

impl ShadowPaths {
    /// Creates the placeholder file and directory in a fresh private temp
    /// directory outside the workspace.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal to the scan: without inert placeholders the
    /// exclusion policy cannot be enforced.
    pub fn provision() -> Result<Self> {
        let scratch = Builder::new()
            .prefix("acage-")
            .tempdir()
            .context("failed to create shadow scratch directory")?
            // Keep the directory on disk past this scope; see module docs.
            .keep();

        let file = scratch.join("empty-file");
        fs::write(&file, b"").context("failed to create shadow placeholder file")?;

        let dir = scratch.join("empty-dir");
        fs::create_dir(&dir).context("failed to create shadow placeholder directory")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&file, fs::Permissions::from_mode(0o444))
                .context("failed to set shadow file permissions")?;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o555))
                .context("failed to set shadow directory permissions")?;
        }

        Ok(Self { file, dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provision_creates_empty_file_and_dir() {
        let shadows = ShadowPaths::provision().unwrap();

        let meta = fs::metadata(&shadows.file).unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.len(), 0);

        let meta = fs::metadata(&shadows.dir).unwrap();
        assert!(meta.is_dir());
        assert_eq!(fs::read_dir(&shadows.dir).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn placeholders_are_read_only() {
        use std::os::unix::fs::PermissionsExt;

        let shadows = ShadowPaths::provision().unwrap();
        let file_mode = fs::metadata(&shadows.file).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o444);
        let dir_mode = fs::metadata(&shadows.dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o555);
    }

    #[test]
    fn each_provision_gets_a_private_scratch_dir() {
        let a = ShadowPaths::provision().unwrap();
        let b = ShadowPaths::provision().unwrap();
        assert_ne!(a.file, b.file);
        assert_ne!(a.dir, b.dir);
    }
}
