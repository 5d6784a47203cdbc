//! Stylefix: diff-scoped style correction for C++ sources
//!
//! A selective corrector: given the files changed relative to a git
//! baseline, it rewrites only the changed lines, applying a small fixed
//! catalog of text-level rules (trailing-return-type split, constructor
//! initializer split, struct-to-class promotion), and remembers which files
//! it has already processed so repeated invocations are idempotent.
//!
//! # Architecture
//!
//! Change discovery ([`diff`]) yields the changed paths and, per file, the
//! touched line numbers. The per-file pass ([`session::format_source`])
//! streams lines through the ordered rule catalog ([`rules`]) and the
//! struct-promotion automaton ([`promote`]), restricted to the changed
//! lines. Processed files are recorded in a persisted set ([`tracking`]) so
//! later batch runs skip them.
//!
//! # Scope
//!
//! All rules operate on single physical lines using pattern matching; there
//! is no grammar or parse tree, by design. The recognized shapes are
//! documented on [`rules`] and [`promote`].
//!
//! # Safety
//!
//! - File rewrites are atomic (tempfile + fsync + rename)
//! - The tracking record is rewritten atomically as well
//! - Files with no hunk information are skipped by default instead of
//!   being formatted wholesale

pub mod diff;
pub mod fsio;
pub mod options;
pub mod promote;
pub mod rules;
pub mod session;
pub mod tracking;

// Re-exports
pub use diff::{ChangeSource, DiffError, GitChangeSource, DEFAULT_BASE_REF, SOURCE_EXTENSIONS};
pub use options::{OptionsError, StyleOptions, DEFAULT_COLUMN_LIMIT, DEFAULT_INDENT_WIDTH};
pub use promote::StructPromoter;
pub use rules::{CtorInitializerSplit, LineRule, RuleSet, TrailingReturnSplit};
pub use session::{
    format_source, FileOutcome, FormatSession, FormatSummary, NoHunkPolicy, SessionError,
};
pub use tracking::{
    JsonTrackingStore, MemoryTrackingStore, TrackingError, TrackingStore, DEFAULT_TRACKING_FILE,
};
