use thiserror::Error;

/// Default maximum line length before split rules trigger.
pub const DEFAULT_COLUMN_LIMIT: usize = 80;
/// Default indentation width for continuation lines.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Formatting parameters shared by the rule set and the struct promoter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleOptions {
    /// Maximum permitted line length in characters
    pub column_limit: usize,
    /// Number of spaces used for continuation/member indentation
    pub indent_width: usize,
}

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("column limit must be a positive integer (got {0})")]
    InvalidColumnLimit(usize),

    #[error("indent width must be a positive integer (got {0})")]
    InvalidIndentWidth(usize),
}

impl StyleOptions {
    /// Create validated options. Both values must be strictly positive.
    pub fn new(column_limit: usize, indent_width: usize) -> Result<Self, OptionsError> {
        if column_limit == 0 {
            return Err(OptionsError::InvalidColumnLimit(column_limit));
        }
        if indent_width == 0 {
            return Err(OptionsError::InvalidIndentWidth(indent_width));
        }
        Ok(Self {
            column_limit,
            indent_width,
        })
    }

    /// One continuation indent as a string of spaces.
    pub fn indent(&self) -> String {
        " ".repeat(self.indent_width)
    }
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            column_limit: DEFAULT_COLUMN_LIMIT,
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}
