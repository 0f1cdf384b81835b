/// String-per-row form used for ledger storage.
///
/// `to_rows` is a plain encoding and keeps spaces. Persisted rows must not
/// contain raw spaces, so publishing code calls `substitute_blank`
/// explicitly before anything leaves the process, and `ensure_persistable`
/// to check the result. Substitution is only meaningful where `0` means
/// blank (see `ZeroMeaning`).

use crate::domain::grid::{Dimensions, Grid};
use crate::domain::symbol::Symbol;
use crate::error::LevelError;

use super::{decode_rows, encode_row};

pub fn to_rows(grid: &Grid) -> Vec<String> {
    grid.rows().map(encode_row).collect()
}

pub fn from_rows<S: AsRef<str>>(rows: &[S], dims: Dimensions) -> Result<Grid, LevelError> {
    decode_rows(rows.iter().map(|r| r.as_ref()), dims)
}

/// Replace every empty cell with the explicit blank character.
pub fn substitute_blank(rows: &[String]) -> Vec<String> {
    let empty = Symbol::Empty.as_char();
    let blank = Symbol::Zero.as_char();
    rows.iter().map(|r| r.replace(empty, &blank.to_string())).collect()
}

/// Rows about to be persisted: alphabet only, no raw spaces.
pub fn ensure_persistable(rows: &[String]) -> Result<(), LevelError> {
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            if ch == Symbol::Empty.as_char() {
                return Err(LevelError::malformed(y, Some(x), "raw space in persisted row"));
            }
            if Symbol::from_char(ch).is_none() {
                return Err(LevelError::malformed(y, Some(x), format!("unknown symbol {ch:?}")));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid {
        let mut g = Grid::empty(Dimensions::ARCADE);
        g.fill_row(6, Symbol::Grass).unwrap();
        g.set(5, 11, Symbol::Portal).unwrap();
        g.set(2, 3, Symbol::Coin).unwrap();
        g
    }

    #[test]
    fn rows_round_trip() {
        let g = sample();
        let rows = to_rows(&g);
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.len() == 12));
        assert_eq!(from_rows(&rows, Dimensions::ARCADE).unwrap(), g);
    }

    #[test]
    fn substitution_is_explicit() {
        let rows = to_rows(&sample());
        assert!(ensure_persistable(&rows).is_err());

        let persisted = substitute_blank(&rows);
        assert_eq!(persisted[2], "000$00000000");
        assert_eq!(persisted[6], "============");
        assert!(ensure_persistable(&persisted).is_ok());
    }

    #[test]
    fn wrong_dimensions_are_malformed() {
        let rows = to_rows(&sample());
        assert!(matches!(
            from_rows(&rows, Dimensions::LEDGER),
            Err(LevelError::MalformedLevel { row: 0, col: Some(12), .. })
        ));
    }
}
