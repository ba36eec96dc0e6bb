//! Policy pattern evaluation.
//!
//! A pattern list matches an entry in one of two ways, decided per pattern:
//! patterns containing a `/` are evaluated against the entry's full
//! workspace-relative path, patterns without one against its base name only.
//! So `*.env` hides every `.env`-suffixed file at any depth, while `build/out`
//! pins down one specific location.

use crate::utils::glob::glob_to_regex;

/// Returns true if any pattern in the list matches the entry.
///
/// `rel_path` is the forward-slash workspace-relative path, `name` the entry's
/// base name. Evaluation stops at the first successful match.
///
/// A syntactically invalid pattern (e.g. an unclosed `[`) simply never
/// matches; it is not reported as an error. This mirrors shell-glob behavior
/// and keeps a single bad line in a config file from taking down the whole
/// plan.
pub fn matches_any(rel_path: &str, name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        let candidate = if pattern.contains('/') { rel_path } else { name };
        glob_to_regex(pattern)
            .map(|re| re.is_match(candidate))
            .unwrap_or(false)
    })
}
