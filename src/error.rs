/// Error taxonomy for the level pipeline.
///
/// `LevelError` covers everything that touches a grid: repair, the codecs and
/// generation. Ledger and wallet failures have their own enums in their
/// modules and wrap `LevelError` where a grid is involved.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LevelError {
    /// Wrong number of lines. Never auto-repaired.
    #[error("expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },

    /// A shape or alphabet violation found where input should already be
    /// normalized. `col` is `None` when the whole row is at fault.
    #[error("malformed level at row {row}{}: {reason}", fmt_col(.col))]
    MalformedLevel {
        row: usize,
        col: Option<usize>,
        reason: String,
    },

    /// The text-generation endpoint produced nothing usable.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Reserved: `repair` always coerces columns, so this is never produced there.
    #[error("grid cannot be coerced: {0}")]
    Shape(String),

    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },

    #[error("invalid preset: {0}")]
    Preset(#[from] serde_json::Error),
}

fn fmt_col(col: &Option<usize>) -> String {
    match col {
        Some(c) => format!(", column {c}"),
        None => String::new(),
    }
}

impl LevelError {
    pub(crate) fn malformed(row: usize, col: Option<usize>, reason: impl Into<String>) -> Self {
        LevelError::MalformedLevel { row, col, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_message_names_row_and_column() {
        let e = LevelError::malformed(4, Some(7), "unknown symbol '!'");
        assert_eq!(e.to_string(), "malformed level at row 4, column 7: unknown symbol '!'");

        let e = LevelError::malformed(2, None, "row has 25 symbols, expected 27");
        assert_eq!(e.to_string(), "malformed level at row 2: row has 25 symbols, expected 27");
    }
}
