//! Change discovery against a git baseline.
//!
//! `GitChangeSource` asks git which files differ from a base reference and
//! which line numbers each diff touches, by parsing unified-diff hunk
//! headers. Diffs are requested with zero context lines (`-U0`) so the
//! `[new_start, new_start + new_count)` range of each hunk covers exactly
//! the added/changed lines and never surrounding context.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Extensions considered for formatting.
pub const SOURCE_EXTENSIONS: &[&str] = &["cpp", "h"];

/// Baseline reference the working tree is compared against by default.
pub const DEFAULT_BASE_REF: &str = "origin/main";

/// `@@ -<old_start>[,<old_count>] +<new_start>[,<new_count>] @@`
static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").expect("valid regex"));

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {args} failed ({status}): {stderr}")]
    Git {
        args: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("malformed hunk header in diff of {path}: {header:?}")]
    MalformedHunk { path: PathBuf, header: String },
}

/// Source of changed files and changed line numbers. Implemented by
/// `GitChangeSource` in production and by stubs in tests.
pub trait ChangeSource {
    /// Paths that differ from the baseline, restricted to the extension
    /// filters, in the order the diff mechanism reports them.
    fn changed_files(&self) -> Result<Vec<PathBuf>, DiffError>;

    /// 1-based line numbers touched by the diff of `path`, sorted ascending.
    /// An empty set means the diff carries no hunk information for the file
    /// (untracked, or identical to the baseline); policy for that case lives
    /// in the orchestrator, not here.
    fn changed_lines(&self, path: &Path) -> Result<BTreeSet<usize>, DiffError>;
}

/// Compares the working tree against a fixed git reference.
pub struct GitChangeSource {
    base_ref: String,
    extensions: Vec<String>,
}

impl GitChangeSource {
    pub fn new(base_ref: impl Into<String>) -> Self {
        Self {
            base_ref: base_ref.into(),
            extensions: SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    fn run_git(&self, args: &[String]) -> Result<String, DiffError> {
        debug!("running git {}", args.join(" "));
        let output = Command::new("git").args(args).output()?;
        if !output.status.success() {
            return Err(DiffError::Git {
                args: args.join(" "),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ChangeSource for GitChangeSource {
    fn changed_files(&self) -> Result<Vec<PathBuf>, DiffError> {
        let mut args = vec![
            "diff".to_string(),
            self.base_ref.clone(),
            "--name-only".to_string(),
            "--".to_string(),
        ];
        args.extend(self.extensions.iter().map(|ext| format!("*.{ext}")));

        let stdout = self.run_git(&args)?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    fn changed_lines(&self, path: &Path) -> Result<BTreeSet<usize>, DiffError> {
        let args = vec![
            "diff".to_string(),
            "-U0".to_string(),
            self.base_ref.clone(),
            "--".to_string(),
            path.to_string_lossy().into_owned(),
        ];
        let stdout = self.run_git(&args)?;
        parse_changed_lines(path, &stdout)
    }
}

/// Collect every line number covered by a hunk's new-file range. A header
/// that fails to parse is a hard error for the run, never silently skipped.
pub fn parse_changed_lines(path: &Path, diff_text: &str) -> Result<BTreeSet<usize>, DiffError> {
    let mut lines = BTreeSet::new();
    for line in diff_text.lines() {
        if !line.starts_with("@@") {
            continue;
        }
        let (start, count) = parse_hunk_header(line).ok_or_else(|| DiffError::MalformedHunk {
            path: path.to_path_buf(),
            header: line.to_string(),
        })?;
        lines.extend(start..start + count);
    }
    Ok(lines)
}

/// `(new_start, new_count)` from one hunk header; an omitted count means 1.
fn parse_hunk_header(header: &str) -> Option<(usize, usize)> {
    let caps = HUNK_HEADER.captures(header)?;
    let start = caps[1].parse().ok()?;
    let count = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    Some((start, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_hunk() {
        let diff = "\
diff --git a/foo.cpp b/foo.cpp
--- a/foo.cpp
+++ b/foo.cpp
@@ -10,2 +12,3 @@ void foo()
+a
+b
+c
";
        let lines = parse_changed_lines(Path::new("foo.cpp"), diff).unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![12, 13, 14]);
    }

    #[test]
    fn test_parse_multiple_hunks_sorted() {
        let diff = "@@ -1,1 +40,2 @@\n@@ -5,1 +3,1 @@\n";
        let lines = parse_changed_lines(Path::new("foo.cpp"), diff).unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![3, 40, 41]);
    }

    #[test]
    fn test_parse_omitted_count_means_one() {
        let diff = "@@ -3 +7 @@\n";
        let lines = parse_changed_lines(Path::new("foo.cpp"), diff).unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_parse_zero_count_deletion_hunk() {
        // Pure deletion: nothing on the new side
        let diff = "@@ -4,2 +3,0 @@\n";
        let lines = parse_changed_lines(Path::new("foo.cpp"), diff).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_parse_empty_diff_yields_empty_set() {
        let lines = parse_changed_lines(Path::new("foo.cpp"), "").unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_malformed_hunk_header_is_fatal() {
        let diff = "@@ -x,2 +3,4 @@\n";
        let result = parse_changed_lines(Path::new("foo.cpp"), diff);
        assert!(matches!(result, Err(DiffError::MalformedHunk { .. })));
    }

    #[test]
    fn test_body_lines_are_not_hunk_headers() {
        let diff = "@@ -1,1 +1,2 @@\n+int a; // @@ not a header\n";
        let lines = parse_changed_lines(Path::new("foo.cpp"), diff).unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }
}
