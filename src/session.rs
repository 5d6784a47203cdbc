//! Batch orchestration: ties change discovery, the rule set, the struct
//! promoter, and the tracking store together.
//!
//! For each changed file that is not yet tracked, the session computes the
//! changed-line set, streams the file's lines through the rule set and the
//! struct promoter (restricted to changed lines when hunk information is
//! available), rewrites the file atomically, and records it as tracked. The
//! tracked set is loaded once at the start of a run and persisted once at
//! the end.

use crate::diff::{ChangeSource, DiffError};
use crate::fsio::atomic_write;
use crate::options::StyleOptions;
use crate::promote::StructPromoter;
use crate::rules::RuleSet;
use crate::tracking::{TrackingError, TrackingStore};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Policy for files whose diff carries no hunk information (untracked file,
/// or a comparison that reported nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoHunkPolicy {
    /// Leave the file untouched (non-destructive default).
    #[default]
    Skip,
    /// Format every line of the file (the permissive fallback).
    FormatAll,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to rewrite {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-file outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was processed this run. `before`/`after` are kept for diff
    /// display; they are equal when the rules found nothing to change.
    Formatted {
        path: PathBuf,
        before: String,
        after: String,
    },
    /// Already present in the tracking record; not touched.
    AlreadyTracked { path: PathBuf },
    /// The diff produced no hunk information and the policy is `Skip`.
    SkippedNoHunks { path: PathBuf },
    /// Reported by the diff but absent from the working tree.
    Missing { path: PathBuf },
}

#[derive(Debug, Default)]
pub struct FormatSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl FormatSummary {
    /// Files newly formatted in this invocation.
    pub fn formatted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Formatted { .. }))
            .count()
    }
}

pub struct FormatSession<'a> {
    options: StyleOptions,
    rules: RuleSet,
    source: &'a dyn ChangeSource,
    store: &'a mut dyn TrackingStore,
    no_hunk_policy: NoHunkPolicy,
    dry_run: bool,
}

impl<'a> FormatSession<'a> {
    pub fn new(
        options: StyleOptions,
        source: &'a dyn ChangeSource,
        store: &'a mut dyn TrackingStore,
    ) -> Self {
        Self {
            options,
            rules: RuleSet::standard(),
            source,
            store,
            no_hunk_policy: NoHunkPolicy::default(),
            dry_run: false,
        }
    }

    pub fn no_hunk_policy(mut self, policy: NoHunkPolicy) -> Self {
        self.no_hunk_policy = policy;
        self
    }

    /// Report what would change without writing files or the tracking record.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(self) -> Result<FormatSummary, SessionError> {
        let mut tracked = self.store.load()?;
        let mut summary = FormatSummary::default();

        for path in self.source.changed_files()? {
            if tracked.contains(&path) {
                summary.outcomes.push(FileOutcome::AlreadyTracked { path });
                continue;
            }
            if !path.exists() {
                debug!("{} is in the diff but not on disk, skipping", path.display());
                summary.outcomes.push(FileOutcome::Missing { path });
                continue;
            }

            let changed = self.source.changed_lines(&path)?;
            if changed.is_empty() && self.no_hunk_policy == NoHunkPolicy::Skip {
                info!("{} has no hunk information, skipping", path.display());
                summary.outcomes.push(FileOutcome::SkippedNoHunks { path });
                continue;
            }

            let before = fs::read_to_string(&path).map_err(|source| SessionError::Read {
                path: path.clone(),
                source,
            })?;
            let filter = if changed.is_empty() {
                None
            } else {
                Some(&changed)
            };
            let after = format_source(&before, &self.options, &self.rules, filter);

            if after != before && !self.dry_run {
                atomic_write(&path, after.as_bytes()).map_err(|source| SessionError::Write {
                    path: path.clone(),
                    source,
                })?;
            }

            tracked.insert(path.clone());
            summary.outcomes.push(FileOutcome::Formatted {
                path,
                before,
                after,
            });
        }

        if !self.dry_run {
            self.store.save(&tracked)?;
        }

        Ok(summary)
    }
}

/// One formatting pass over a file's contents.
///
/// When `changed` is given, rules and promotion apply only to those 1-based
/// line numbers; every other line is emitted byte-identical (terminator
/// included) and does not advance the promoter's scan state. When it is
/// `None`, every line is eligible. A line consumed by a split rule fully
/// replaces its contribution to the output and is not seen by the promoter.
///
/// Line terminators stay attached throughout the pass, so untouched CRLF
/// lines round-trip unmodified; a line a rule rewrites keeps its own
/// terminator on every emitted replacement line.
pub fn format_source(
    content: &str,
    options: &StyleOptions,
    rules: &RuleSet,
    changed: Option<&BTreeSet<usize>>,
) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut promoter = StructPromoter::new(options);

    for (index, raw) in content.split_inclusive('\n').enumerate() {
        if let Some(filter) = changed {
            if !filter.contains(&(index + 1)) {
                out.push(raw.to_string());
                continue;
            }
        }

        let (line, eol) = split_line_terminator(raw);
        if let Some(replacement) = rules.apply(line, options) {
            // An unterminated final line still needs its replacement lines
            // separated; the last one stays unterminated like the input.
            let sep = if eol.is_empty() { "\n" } else { eol };
            out.push(format!("{}{}", replacement.join(sep), eol));
            continue;
        }

        // The promoter works on the raw segment: trim-based matching is
        // terminator-agnostic and pass-through keeps the line byte-identical.
        promoter.feed(raw, &mut out);
    }

    out.concat()
}

/// Split one `split_inclusive` segment into its content and terminator
/// (`"\r\n"`, `"\n"`, or `""` for an unterminated final line).
fn split_line_terminator(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all(content: &str) -> String {
        format_source(content, &StyleOptions::default(), &RuleSet::standard(), None)
    }

    #[test]
    fn test_format_source_splits_long_signature() {
        let content = "ReturnTypeLongEnough Namespace::Foo::bar(int argumentOne, int argumentTwo) -> ReturnTypeLongEnough\n";
        let out = run_all(content);
        assert_eq!(
            out,
            "ReturnTypeLongEnough Namespace::Foo::bar(int argumentOne, int argumentTwo)\n    -> ReturnTypeLongEnough\n"
        );
    }

    #[test]
    fn test_format_source_promotes_struct() {
        let content = "struct Point {\n    int x;\npublic:\n    int y;\n};\n";
        let out = run_all(content);
        assert_eq!(out, "class Point {\n    int x;\npublic:\n    int y;\n};\n");
    }

    #[test]
    fn test_line_filter_fidelity() {
        let long = "Foo::Foo(int a, int b, int c, int d, int e) : a_(a), b_(b), c_(c), d_(d), e_(e) {}";
        let content = format!("{long}\n{long}\n");

        let changed: BTreeSet<usize> = [2].into_iter().collect();
        let out = format_source(
            &content,
            &StyleOptions::default(),
            &RuleSet::standard(),
            Some(&changed),
        );

        let lines: Vec<&str> = out.lines().collect();
        // Line 1 is outside the filter: byte-identical. Line 2 was split.
        assert_eq!(lines[0], long);
        assert_eq!(lines[1], "Foo::Foo(int a, int b, int c, int d, int e)");
        assert_eq!(lines[2], "    : a_(a), b_(b), c_(c), d_(d), e_(e) {}");
    }

    #[test]
    fn test_filtered_lines_do_not_advance_promoter_state() {
        let content = "struct S {\npublic:\n};\n";
        // Only line 2 is eligible: the struct start and end are never seen,
        // so no promotion happens.
        let changed: BTreeSet<usize> = [2].into_iter().collect();
        let out = format_source(
            &content,
            &StyleOptions::default(),
            &RuleSet::standard(),
            Some(&changed),
        );
        assert_eq!(out, content);
    }

    #[test]
    fn test_crlf_unfiltered_lines_round_trip() {
        let long = "Foo::Foo(int a, int b, int c, int d, int e) : a_(a), b_(b), c_(c), d_(d), e_(e) {}";
        let content = format!("int untouched;\r\n{long}\r\n");

        let changed: BTreeSet<usize> = [2].into_iter().collect();
        let out = format_source(
            &content,
            &StyleOptions::default(),
            &RuleSet::standard(),
            Some(&changed),
        );

        // The unfiltered line keeps its CRLF terminator byte-identical; the
        // split line keeps CRLF on both halves.
        assert_eq!(
            out,
            "int untouched;\r\nFoo::Foo(int a, int b, int c, int d, int e)\r\n    : a_(a), b_(b), c_(c), d_(d), e_(e) {}\r\n"
        );
    }

    #[test]
    fn test_crlf_file_with_no_applicable_rules_is_byte_identical() {
        let content = "int a;\r\nint b;\r\n";
        let changed: BTreeSet<usize> = [1].into_iter().collect();
        let out = format_source(
            content,
            &StyleOptions::default(),
            &RuleSet::standard(),
            Some(&changed),
        );
        assert_eq!(out, content);
    }

    #[test]
    fn test_unterminated_final_line_split_stays_unterminated() {
        let long = "Foo::Foo(int a, int b, int c, int d, int e) : a_(a), b_(b), c_(c), d_(d), e_(e) {}";
        let out = run_all(long);
        assert_eq!(
            out,
            "Foo::Foo(int a, int b, int c, int d, int e)\n    : a_(a), b_(b), c_(c), d_(d), e_(e) {}"
        );
    }

    #[test]
    fn test_format_source_preserves_missing_trailing_newline() {
        let content = "int x;";
        assert_eq!(run_all(content), "int x;");
    }

    #[test]
    fn test_format_source_is_idempotent() {
        let content = "\
ReturnTypeLongEnough Namespace::Foo::bar(int argumentOne, int argumentTwo) -> ReturnTypeLongEnough
struct Plain {
        int x;
};
";
        let once = run_all(content);
        let twice = run_all(&once);
        assert_eq!(once, twice);
    }
}
