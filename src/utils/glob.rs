//! Shell-glob pattern matching for overlay policy rules.
//!
//! Converts glob patterns (used in ignore/readonly policy lists) into compiled
//! regular expressions for matching against relative paths and file names.
//!
//! Supported glob syntax:
//! - `*` - Matches any characters except `/` (stays within a path segment)
//! - `?` - Matches exactly one character except `/`
//! - `[...]` - Character class (passed through to regex)
//! - All other characters are escaped as regex literals
//!
//! There is no `**` operator: policy patterns follow classic shell-glob
//! semantics where a wildcard never crosses a path separator. A pattern that
//! needs to anchor into subdirectories spells the separators out
//! (e.g. `target/*/deps`).
//!
//! # Examples
//!
//! ```
//! use acage::utils::glob::glob_to_regex;
//!
//! # fn main() -> anyhow::Result<()> {
//! let re = glob_to_regex("*.env")?;
//! assert!(re.is_match("secrets.env"));
//! assert!(!re.is_match("conf/secrets.env")); // * does not cross /
//!
//! let re = glob_to_regex("build/[ab]?.o")?;
//! assert!(re.is_match("build/a1.o"));
//! assert!(!re.is_match("build/c1.o"));
//! # Ok(())
//! # }
//! ```

use anyhow::{anyhow, Result};
use regex::Regex;

/// Converts a glob pattern to a compiled regular expression.
///
/// The resulting regex is anchored with `^` and `$`, so it matches the entire
/// candidate string, never a substring.
///
/// # Errors
///
/// Returns an error if the pattern contains an unclosed character class or the
/// generated regex fails to compile. Callers that want shell-style leniency
/// (a malformed pattern simply never matches) should treat the error as a
/// non-match rather than propagating it.
pub fn glob_to_regex(glob: &str) -> Result<Regex> {
    let regex_str = glob_to_regex_string(glob)?;
    Regex::new(&regex_str).map_err(|e| anyhow!("failed to compile glob pattern to regex: {}", e))
}

/// Converts a glob pattern to an anchored regex pattern string.
fn glob_to_regex_string(glob: &str) -> Result<String> {
    let mut regex = String::from("^");
    let mut chars = glob.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                // * matches anything within one path segment
                regex.push_str("[^/]*");
            }
            '?' => {
                // ? matches a single character except /
                regex.push_str("[^/]");
            }
            '[' => {
                // Character class: pass through until the closing ]
                let mut class = String::from("[");
                let mut closed = false;
                for ch in chars.by_ref() {
                    class.push(ch);
                    if ch == ']' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(anyhow!(
                        "unclosed character class '[' in glob pattern: {}",
                        glob
                    ));
                }
                regex.push_str(&class);
            }
            _ => {
                let escaped = regex::escape(&ch.to_string());
                regex.push_str(&escaped);
            }
        }
    }

    regex.push('$');
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern() -> Result<()> {
        let re = glob_to_regex("file.txt")?;
        assert!(re.is_match("file.txt"));
        assert!(!re.is_match("file.rs"));
        assert!(!re.is_match("dir/file.txt"));
        Ok(())
    }

    #[test]
    fn single_asterisk_stays_in_segment() -> Result<()> {
        let re = glob_to_regex("*.env")?;
        assert!(re.is_match("secrets.env"));
        assert!(re.is_match(".env"));
        assert!(!re.is_match("conf/secrets.env"));
        Ok(())
    }

    #[test]
    fn asterisk_in_path_pattern() -> Result<()> {
        let re = glob_to_regex("target/*/deps")?;
        assert!(re.is_match("target/debug/deps"));
        assert!(!re.is_match("target/debug/build/deps")); // * doesn't match /
        Ok(())
    }

    #[test]
    fn question_mark() -> Result<()> {
        let re = glob_to_regex("file?.txt")?;
        assert!(re.is_match("file1.txt"));
        assert!(!re.is_match("file.txt"));
        assert!(!re.is_match("file12.txt"));
        assert!(!re.is_match("file/.txt"));
        Ok(())
    }

    #[test]
    fn character_class() -> Result<()> {
        let re = glob_to_regex("[abc]*.js")?;
        assert!(re.is_match("app.js"));
        assert!(re.is_match("bundle.js"));
        assert!(!re.is_match("main.js"));
        Ok(())
    }

    #[test]
    fn character_class_range() -> Result<()> {
        let re = glob_to_regex("[a-z]*.txt")?;
        assert!(re.is_match("abc.txt"));
        assert!(!re.is_match("ABC.txt"));
        assert!(!re.is_match("123.txt"));
        Ok(())
    }

    #[test]
    fn regex_special_chars_escaped() -> Result<()> {
        let re = glob_to_regex("lib.v2.so")?;
        assert!(re.is_match("lib.v2.so"));
        assert!(!re.is_match("libXv2Xso")); // . must not match any char
        Ok(())
    }

    #[test]
    fn consecutive_asterisks_stay_in_segment() -> Result<()> {
        // ** collapses to two single-segment wildcards, it is not recursive
        let re = glob_to_regex("**")?;
        assert!(re.is_match("anything"));
        assert!(!re.is_match("any/thing"));
        Ok(())
    }

    #[test]
    fn unclosed_character_class_is_error() {
        let result = glob_to_regex("file[abc");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unclosed character class"));
    }

    #[test]
    fn empty_pattern_matches_only_empty() -> Result<()> {
        let re = glob_to_regex("")?;
        assert!(re.is_match(""));
        assert!(!re.is_match("anything"));
        Ok(())
    }

    #[test]
    fn anchoring_rejects_substrings() -> Result<()> {
        let re = glob_to_regex(".git")?;
        assert!(re.is_match(".git"));
        assert!(!re.is_match(".github"));
        assert!(!re.is_match("a.git"));
        Ok(())
    }
}
