/// Fixed-size symbol grid.
///
/// Cells are stored row-major in a flat `Vec`. Every row has exactly
/// `width` symbols and there are exactly `height` rows; the constructors
/// refuse anything else, so a `Grid` value is always rectangular.
///
/// Coordinates are `(row, col)` with row 0 at the top.

use serde::{Deserialize, Serialize};

use crate::domain::symbol::{Symbol, SymbolTable, ZeroMeaning};
use crate::error::LevelError;

pub const DEFAULT_WIDTH: usize = 27;
pub const DEFAULT_HEIGHT: usize = 11;

/// Smallest side length that leaves room for the exit fallback (row 1)
/// and the floor fallback (last row) without overlap.
pub const MIN_SIDE: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    /// On-chain levels.
    pub const LEDGER: Dimensions = Dimensions { width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT };
    /// Local preset levels.
    pub const ARCADE: Dimensions = Dimensions { width: 12, height: 7 };

    pub fn new(width: usize, height: usize) -> Result<Self, LevelError> {
        if width < MIN_SIDE || height < MIN_SIDE {
            return Err(LevelError::Shape(format!(
                "{width}x{height} is too small, both sides must be at least {MIN_SIDE}"
            )));
        }
        Ok(Dimensions { width, height })
    }

    pub fn cells(&self) -> usize {
        self.width * self.height
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions::LEDGER
    }
}

/// Grid dimensions plus the symbol table of one deployment context.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LevelProfile {
    pub dims: Dimensions,
    pub table: SymbolTable,
}

impl LevelProfile {
    pub const LEDGER: LevelProfile = LevelProfile {
        dims: Dimensions::LEDGER,
        table: SymbolTable::LEDGER,
    };
    pub const ARCADE: LevelProfile = LevelProfile {
        dims: Dimensions::ARCADE,
        table: SymbolTable::ARCADE,
    };

    pub fn new(dims: Dimensions, zero: ZeroMeaning) -> Self {
        LevelProfile { dims, table: SymbolTable::new(zero) }
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }
}

impl Default for LevelProfile {
    fn default() -> Self {
        LevelProfile::LEDGER
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    dims: Dimensions,
    cells: Vec<Symbol>,
}

impl Grid {
    pub fn filled(dims: Dimensions, symbol: Symbol) -> Self {
        Grid { dims, cells: vec![symbol; dims.cells()] }
    }

    pub fn empty(dims: Dimensions) -> Self {
        Grid::filled(dims, Symbol::Empty)
    }

    /// Build from rows, which must all have the same length.
    pub fn from_rows(rows: Vec<Vec<Symbol>>) -> Result<Self, LevelError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if height == 0 || width == 0 {
            return Err(LevelError::malformed(0, None, "grid has no cells"));
        }
        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(LevelError::malformed(
                    y,
                    None,
                    format!("row has {} symbols, expected {width}", row.len()),
                ));
            }
            cells.extend(row);
        }
        Ok(Grid { dims: Dimensions { width, height }, cells })
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Symbol> {
        if row >= self.dims.height || col >= self.dims.width {
            return None;
        }
        Some(self.cells[row * self.dims.width + col])
    }

    pub fn set(&mut self, row: usize, col: usize, symbol: Symbol) -> Result<(), LevelError> {
        if row >= self.dims.height || col >= self.dims.width {
            return Err(LevelError::OutOfBounds { row, col });
        }
        self.cells[row * self.dims.width + col] = symbol;
        Ok(())
    }

    pub fn row(&self, row: usize) -> &[Symbol] {
        let start = row * self.dims.width;
        &self.cells[start..start + self.dims.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Symbol]> {
        self.cells.chunks(self.dims.width)
    }

    pub fn fill_row(&mut self, row: usize, symbol: Symbol) -> Result<(), LevelError> {
        if row >= self.dims.height {
            return Err(LevelError::OutOfBounds { row, col: 0 });
        }
        let start = row * self.dims.width;
        self.cells[start..start + self.dims.width].fill(symbol);
        Ok(())
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.cells.contains(&symbol)
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells.iter().filter(|s| **s == symbol).count()
    }

    pub fn positions(&self, symbol: Symbol) -> Vec<Position> {
        let w = self.dims.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == symbol)
            .map(|(i, _)| Position::new(i / w, i % w))
            .collect()
    }

    pub fn any(&self, mut pred: impl FnMut(Symbol) -> bool) -> bool {
        self.cells.iter().any(|s| pred(*s))
    }
}
