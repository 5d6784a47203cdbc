//! Struct-to-class promotion and struct member re-indentation.
//!
//! A forward, single-pass automaton over the line stream. A `struct` body
//! that contains an access-specifier section (`public:`, `private:`,
//! `protected:`) is promoted to a `class` by retroactively rewriting its
//! buffered declaration line; a body without one keeps the `struct` keyword
//! and has over-indented member lines normalized down to one indent.
//!
//! Invariant: struct bodies do not nest and are always closed by a line
//! whose stripped form starts with `};`. A nested declaration is flagged as
//! unsupported and the outer struct is abandoned unpromoted rather than
//! mis-promoted.

use crate::options::StyleOptions;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

static STRUCT_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^struct\s+\w+").expect("valid regex"));

static ACCESS_SPECIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(public|private|protected)\s*:$").expect("valid regex"));

/// Scan state, carrying the output-buffer index of the open struct's
/// declaration line so it can be rewritten when the body closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    InsideNoModifier { decl: usize },
    InsideWithModifier { decl: usize },
}

pub struct StructPromoter {
    state: ScanState,
    indent_width: usize,
}

impl StructPromoter {
    pub fn new(options: &StyleOptions) -> Self {
        Self {
            state: ScanState::Outside,
            indent_width: options.indent_width,
        }
    }

    /// Feed one line. The (possibly re-indented) line is pushed onto `out`;
    /// closing a promoted struct rewrites its declaration line in place.
    /// Lines may carry their terminator: matching is trim-based, and
    /// pass-through keeps the input bytes untouched.
    pub fn feed(&mut self, line: &str, out: &mut Vec<String>) {
        let stripped = line.trim();

        if STRUCT_START.is_match(stripped) {
            if self.state != ScanState::Outside {
                warn!("nested struct declarations are unsupported, outer struct left unpromoted: {stripped}");
            }
            self.state = ScanState::InsideNoModifier { decl: out.len() };
            out.push(line.to_string());
            return;
        }

        match self.state {
            ScanState::Outside => out.push(line.to_string()),

            ScanState::InsideNoModifier { decl } => {
                if ACCESS_SPECIFIER.is_match(stripped) {
                    self.state = ScanState::InsideWithModifier { decl };
                    out.push(line.to_string());
                } else if stripped.starts_with("};") {
                    self.state = ScanState::Outside;
                    out.push(line.to_string());
                } else if let Some(fixed) = reindent_member(line, self.indent_width) {
                    out.push(fixed);
                } else {
                    out.push(line.to_string());
                }
            }

            ScanState::InsideWithModifier { decl } => {
                if stripped.starts_with("};") {
                    out[decl] = out[decl].replacen("struct", "class", 1);
                    self.state = ScanState::Outside;
                }
                out.push(line.to_string());
            }
        }
    }
}

/// Members indented at or beyond two indents are pulled back to exactly one.
fn reindent_member(line: &str, indent_width: usize) -> Option<String> {
    let body = line.trim_start();
    if body.is_empty() {
        return None;
    }
    let leading = line.len() - body.len();
    if leading >= indent_width * 2 {
        Some(format!("{}{}", " ".repeat(indent_width), body))
    } else {
        None
    }
}

/// Run the promoter over a full line sequence. Convenience for callers that
/// are not interleaving rule application.
pub fn promote_lines<I, S>(lines: I, options: &StyleOptions) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut promoter = StructPromoter::new(options);
    let mut out = Vec::new();
    for line in lines {
        promoter.feed(line.as_ref(), &mut out);
    }
    out
}
