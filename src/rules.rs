//! Line-rewrite rules for diff-scoped style correction.
//!
//! Each rule is a pure function from one input line to an optional
//! replacement sequence of output lines. Rules match against the stripped
//! line text and only fire when the full original line exceeds the
//! configured column limit, so a line that fits is never split. The rule
//! set applies the first matching rule per line; rules never compose.
//!
//! Recognized line shapes (and nothing more — this is pattern matching,
//! not parsing):
//! - `<signature> -> <returnType>` where the arrow is not directly
//!   preceded by the word `operator`
//! - `<Type>::<Ctor>(<params>) : <initializers>`

use crate::options::StyleOptions;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// `Type::Ctor(params) : initializers` — greedy params capture backtracks
/// to the last `)` that is followed by a colon, which tolerates parentheses
/// inside the initializer list itself.
static CTOR_INITIALIZER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+::\w+)\((.*)\)\s*:\s*(.*)$").expect("valid regex"));

/// A single line-rewrite rule: a predicate plus a transform.
pub trait LineRule {
    fn name(&self) -> &'static str;

    /// Returns the replacement lines when the rule applies, `None` otherwise.
    fn apply(&self, line: &str, options: &StyleOptions) -> Option<Vec<String>>;
}

/// Splits `<signature> -> <returnType>` onto two lines.
pub struct TrailingReturnSplit;

/// Splits `<Type>::<Ctor>(<params>) : <initializers>` onto two lines.
pub struct CtorInitializerSplit;

/// The ordered rule catalog. First match wins.
pub struct RuleSet {
    rules: Vec<Box<dyn LineRule + Send + Sync>>,
}

impl RuleSet {
    /// The standard catalog: trailing-return split, then constructor
    /// initializer split.
    pub fn standard() -> Self {
        Self {
            rules: vec![Box::new(TrailingReturnSplit), Box::new(CtorInitializerSplit)],
        }
    }

    /// Apply the first matching rule, returning its replacement lines.
    pub fn apply(&self, line: &str, options: &StyleOptions) -> Option<Vec<String>> {
        for rule in &self.rules {
            if let Some(replacement) = rule.apply(line, options) {
                debug!("{} split a {}-char line", rule.name(), line.chars().count());
                return Some(replacement);
            }
        }
        None
    }
}

impl LineRule for TrailingReturnSplit {
    fn name(&self) -> &'static str {
        "trailing-return-split"
    }

    fn apply(&self, line: &str, options: &StyleOptions) -> Option<Vec<String>> {
        if line.chars().count() <= options.column_limit {
            return None;
        }

        let stripped = line.trim();
        let (signature, return_type) = split_trailing_return(stripped)?;

        Some(vec![
            format!("{}{}", leading_whitespace(line), signature),
            format!("{}-> {}", options.indent(), return_type),
        ])
    }
}

impl LineRule for CtorInitializerSplit {
    fn name(&self) -> &'static str {
        "ctor-initializer-split"
    }

    fn apply(&self, line: &str, options: &StyleOptions) -> Option<Vec<String>> {
        if line.chars().count() <= options.column_limit {
            return None;
        }

        let stripped = line.trim();
        let caps = CTOR_INITIALIZER.captures(stripped)?;

        Some(vec![
            format!("{}{}({})", leading_whitespace(line), &caps[1], &caps[2]),
            format!("{}: {}", options.indent(), &caps[3]),
        ])
    }
}

/// Find the first `->` whose preceding token is not `operator` and split
/// around it. Returns `(signature, return type)`, both trimmed.
///
/// `operator->` overload spellings are skipped: their arrow is glued to the
/// `operator` keyword, so the search continues past them (an actual trailing
/// return type further right still matches).
fn split_trailing_return(stripped: &str) -> Option<(&str, &str)> {
    let mut search = 0;
    while let Some(found) = stripped[search..].find("->") {
        let at = search + found;
        let signature = stripped[..at].trim_end();
        if !signature.ends_with("operator") {
            let return_type = stripped[at + 2..].trim();
            if !return_type.is_empty() {
                return Some((signature, return_type));
            }
        }
        search = at + 2;
    }
    None
}

/// The leading whitespace of `line` (empty for unindented lines).
fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}
