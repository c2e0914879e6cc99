use regex::Regex;

use std::sync::LazyLock;

use crate::error::FlowError;
use crate::operators::Mapper;
use crate::row::Row;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strips every character that is neither alphanumeric nor whitespace
/// from a string column.  Underscores count as punctuation.
pub struct FilterPunctuation {
    column: String,
}

impl FilterPunctuation {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for FilterPunctuation {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, FlowError> {
        let text = row.require_str(&self.column)?;
        let cleaned: String = text
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        row.insert(self.column.clone(), cleaned);
        Ok(vec![row])
    }
}

/// Lower-cases a string column.
pub struct LowerCase {
    column: String,
}

impl LowerCase {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for LowerCase {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, FlowError> {
        let lowered = row.require_str(&self.column)?.to_lowercase();
        row.insert(self.column.clone(), lowered);
        Ok(vec![row])
    }
}

/// Splits a string column on a separator pattern, emitting one row per
/// token with every other column duplicated.  Empty leading or trailing
/// segments are tokens too, matching `Regex::split`.
pub struct Split {
    column: String,
    separator: Regex,
}

impl Split {
    /// Splits on runs of whitespace.
    pub fn new(column: impl Into<String>) -> Self {
        Self::with_separator(column, WHITESPACE.clone())
    }

    pub fn with_separator(column: impl Into<String>, separator: Regex) -> Self {
        Self {
            column: column.into(),
            separator,
        }
    }
}

impl Mapper for Split {
    fn map(&self, row: Row) -> Result<Vec<Row>, FlowError> {
        let text = row.require_str(&self.column)?.to_owned();
        Ok(self
            .separator
            .split(&text)
            .map(|token| {
                let mut out = row.clone();
                out.insert(self.column.clone(), token);
                out
            })
            .collect())
    }
}
