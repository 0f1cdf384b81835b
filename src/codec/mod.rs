/// Conversions between `Grid` and its external representations.
///
///   - `text`: newline-joined rows (prompt/response, terminal files)
///   - `rows`: one string per row (ledger storage)
///   - `bracketed`: legacy `[["row",...],[...]]` text
///   - `preset`: JSON preset files
///   - `tiles`: engine tile table (one-way)
///
/// Decoders here are strict: they expect input already normalized by
/// `repair` and report anything else as `MalformedLevel`.

pub mod bracketed;
pub mod preset;
pub mod rows;
pub mod text;
pub mod tiles;

use crate::domain::grid::{Dimensions, Grid};
use crate::domain::symbol::Symbol;
use crate::error::LevelError;

/// Decode exactly `dims.height` rows of exactly `dims.width` symbols.
pub(crate) fn decode_rows<'a, I>(rows: I, dims: Dimensions) -> Result<Grid, LevelError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::with_capacity(dims.height);
    for (y, line) in rows.into_iter().enumerate() {
        if y >= dims.height {
            return Err(LevelError::malformed(y, None, format!("unexpected row, level has {} rows", dims.height)));
        }
        let mut row = Vec::with_capacity(dims.width);
        for (x, ch) in line.chars().enumerate() {
            if x >= dims.width {
                return Err(LevelError::malformed(y, Some(x), format!("row is longer than {}", dims.width)));
            }
            let symbol = Symbol::from_char(ch)
                .ok_or_else(|| LevelError::malformed(y, Some(x), format!("unknown symbol {ch:?}")))?;
            row.push(symbol);
        }
        if row.len() < dims.width {
            return Err(LevelError::malformed(
                y,
                Some(row.len()),
                format!("row has {} symbols, expected {}", row.len(), dims.width),
            ));
        }
        out.push(row);
    }
    if out.len() < dims.height {
        return Err(LevelError::malformed(out.len(), None, format!("missing row, level has {} rows", dims.height)));
    }
    Grid::from_rows(out)
}

pub(crate) fn encode_row(row: &[Symbol]) -> String {
    row.iter().map(|s| s.as_char()).collect()
}
