/// Grid validation and repair.
///
/// `repair` turns raw lines (typed by a person or returned by a model) into
/// a playable `Grid`. Column problems and unknown symbols are always fixed
/// and reported as `Warning`s; a wrong number of rows is an error because
/// inventing whole rows would invent level geometry.
///
/// Steps, in order:
///   1. row count must equal `height`
///   2. each row is right-padded with empty or truncated to `width`
///   3. characters outside the alphabet become empty
///   4. no portal: one is placed at (row 1, column `width - 2`);
///      nothing to stand on: the bottom row becomes ground, keeping any
///      portal already there
///
/// The result is deterministic and idempotent: repairing a repaired grid
/// yields the same grid and no warnings.

use std::fmt;

use crate::domain::grid::{Grid, LevelProfile, Position};
use crate::domain::symbol::Symbol;
use crate::error::LevelError;

/// Row that receives the fallback portal.
pub const EXIT_FALLBACK_ROW: usize = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    RowLength { row: usize, original: usize, corrected: usize },
    InvalidSymbol { row: usize, col: usize, found: char },
    ExitInserted { at: Position },
    FloorInserted { row: usize },
}

impl Warning {
    /// Row the warning is about.
    pub fn row(&self) -> usize {
        match self {
            Warning::RowLength { row, .. }
            | Warning::InvalidSymbol { row, .. }
            | Warning::FloorInserted { row } => *row,
            Warning::ExitInserted { at } => at.row,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::RowLength { row, original, corrected } if original < corrected => {
                write!(f, "row {}: padded from {original} to {corrected} characters", row + 1)
            }
            Warning::RowLength { row, original, corrected } => {
                write!(f, "row {}: truncated from {original} to {corrected} characters", row + 1)
            }
            Warning::InvalidSymbol { row, col, found } => {
                write!(f, "row {}, column {}: replaced invalid symbol {found:?} with space", row + 1, col + 1)
            }
            Warning::ExitInserted { at } => {
                write!(f, "added missing portal at row {}, column {}", at.row + 1, at.col + 1)
            }
            Warning::FloorInserted { row } => {
                write!(f, "added ground across row {} so the level is playable", row + 1)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repaired {
    pub grid: Grid,
    pub warnings: Vec<Warning>,
}

impl Repaired {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Fallback portal position for a grid of the given width.
pub fn exit_fallback(width: usize) -> Position {
    Position::new(EXIT_FALLBACK_ROW, width.saturating_sub(2))
}

pub fn repair<S: AsRef<str>>(lines: &[S], profile: &LevelProfile) -> Result<Repaired, LevelError> {
    let dims = profile.dims;
    if lines.len() != dims.height {
        return Err(LevelError::RowCount { expected: dims.height, actual: lines.len() });
    }

    let mut warnings = Vec::new();
    let mut rows = Vec::with_capacity(dims.height);

    for (y, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let original = line.chars().count();
        if original != dims.width {
            warnings.push(Warning::RowLength { row: y, original, corrected: dims.width });
        }

        let mut row = Vec::with_capacity(dims.width);
        for (x, ch) in line.chars().take(dims.width).enumerate() {
            match Symbol::from_char(ch) {
                Some(s) => row.push(s),
                None => {
                    warnings.push(Warning::InvalidSymbol { row: y, col: x, found: ch });
                    row.push(Symbol::Empty);
                }
            }
        }
        row.resize(dims.width, Symbol::Empty);
        rows.push(row);
    }

    let mut grid = Grid::from_rows(rows)?;
    enforce_invariants(&mut grid, profile, &mut warnings)?;

    for w in &warnings {
        tracing::debug!(warning = %w, "grid repaired");
    }

    Ok(Repaired { grid, warnings })
}

fn enforce_invariants(
    grid: &mut Grid,
    profile: &LevelProfile,
    warnings: &mut Vec<Warning>,
) -> Result<(), LevelError> {
    insert_exit(grid, warnings)?;

    if !grid.any(|s| profile.table.is_surface(s)) {
        let bottom = grid.height() - 1;
        for col in 0..grid.width() {
            if grid.get(bottom, col) != Some(Symbol::EXIT) {
                grid.set(bottom, col, Symbol::PRIMARY_GROUND)?;
            }
        }
        // A bottom row made only of portals leaves nothing to stand on.
        if !grid.any(|s| profile.table.is_surface(s)) {
            grid.fill_row(bottom, Symbol::PRIMARY_GROUND)?;
        }
        warnings.push(Warning::FloorInserted { row: bottom });
        // The fallback row is never the bottom row, so this cannot undo the floor.
        insert_exit(grid, warnings)?;
    }

    Ok(())
}

fn insert_exit(grid: &mut Grid, warnings: &mut Vec<Warning>) -> Result<(), LevelError> {
    if !grid.contains(Symbol::EXIT) {
        let at = exit_fallback(grid.width());
        grid.set(at.row, at.col, Symbol::EXIT)?;
        warnings.push(Warning::ExitInserted { at });
    }
    Ok(())
}

/// Strict check used where input must already be normalized: any warning
/// `repair` would emit becomes a `MalformedLevel`.
pub fn validate<S: AsRef<str>>(lines: &[S], profile: &LevelProfile) -> Result<Grid, LevelError> {
    let repaired = repair(lines, profile)?;
    match repaired.warnings.first() {
        None => Ok(repaired.grid),
        Some(w) => {
            let col = match w {
                Warning::InvalidSymbol { col, .. } => Some(*col),
                Warning::ExitInserted { at } => Some(at.col),
                _ => None,
            };
            Err(LevelError::malformed(w.row(), col, w.to_string()))
        }
    }
}
