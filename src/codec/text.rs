/// Newline-joined text form: `height` lines of `width` characters,
/// no trailing newline. This is what the generation endpoint returns and
/// what level files on disk contain.

use crate::domain::grid::{Dimensions, Grid};
use crate::error::LevelError;

use super::{decode_rows, encode_row};

pub fn to_text(grid: &Grid) -> String {
    grid.rows().map(encode_row).collect::<Vec<_>>().join("\n")
}

/// Strict parse. `\r\n` line endings are accepted.
pub fn from_text(text: &str, dims: Dimensions) -> Result<Grid, LevelError> {
    decode_rows(text.lines(), dims)
}
