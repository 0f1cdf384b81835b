/// Cell-by-cell level editing.
///
/// The buffer always holds a grid of exactly the profile's dimensions, so
/// the only repairs `finish` can apply are the playability ones (portal and
/// ground).

use crate::codec::{rows, text};
use crate::domain::grid::{Grid, LevelProfile, Position};
use crate::domain::level::Level;
use crate::domain::symbol::Symbol;
use crate::error::LevelError;
use crate::repair::{repair, Warning};

#[derive(Clone, Debug)]
pub struct EditorBuffer {
    profile: LevelProfile,
    grid: Grid,
    cursor: Position,
    brush: Symbol,
    dirty: bool,
}

impl EditorBuffer {
    pub fn new(profile: LevelProfile) -> Self {
        EditorBuffer {
            profile,
            grid: Grid::empty(profile.dims),
            cursor: Position::new(0, 0),
            brush: Symbol::PRIMARY_GROUND,
            dirty: false,
        }
    }

    pub fn from_grid(profile: LevelProfile, grid: Grid) -> Result<Self, LevelError> {
        if grid.dims() != profile.dims {
            return Err(LevelError::Shape(format!(
                "grid is {}x{}, editor expects {}x{}",
                grid.width(),
                grid.height(),
                profile.width(),
                profile.height()
            )));
        }
        Ok(EditorBuffer { grid, ..EditorBuffer::new(profile) })
    }

    /// Open level text, repairing it first. The warnings say what changed.
    pub fn open_text(profile: LevelProfile, source: &str) -> Result<(Self, Vec<Warning>), LevelError> {
        let lines: Vec<&str> = source.lines().collect();
        let repaired = repair(&lines, &profile)?;
        let buffer = EditorBuffer::from_grid(profile, repaired.grid)?;
        Ok((buffer, repaired.warnings))
    }

    // ── Accessors ──

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn profile(&self) -> &LevelProfile {
        &self.profile
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn brush(&self) -> Symbol {
        self.brush
    }

    /// Edited since opening or the last `mark_saved`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // ── Cursor ──

    /// Move by a signed offset, stopping at the edges.
    pub fn move_by(&mut self, d_row: isize, d_col: isize) {
        let row = self.cursor.row.saturating_add_signed(d_row).min(self.grid.height() - 1);
        let col = self.cursor.col.saturating_add_signed(d_col).min(self.grid.width() - 1);
        self.cursor = Position::new(row, col);
    }

    pub fn move_to(&mut self, row: usize, col: usize) {
        self.cursor = Position::new(row.min(self.grid.height() - 1), col.min(self.grid.width() - 1));
    }

    // ── Brush ──

    pub fn set_brush(&mut self, symbol: Symbol) {
        self.brush = symbol;
    }

    /// Step through the alphabet, wrapping at either end.
    pub fn cycle_brush(&mut self, forward: bool) {
        let n = Symbol::ALL.len();
        let i = Symbol::ALL.iter().position(|s| *s == self.brush).unwrap_or(0);
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        self.brush = Symbol::ALL[next];
    }

    // ── Edits ──

    pub fn paint(&mut self) {
        self.put(self.cursor, self.brush);
    }

    pub fn erase(&mut self) {
        self.put(self.cursor, Symbol::Empty);
    }

    /// Brush across the cursor's whole row.
    pub fn fill_row(&mut self) {
        for col in 0..self.grid.width() {
            self.put(Position::new(self.cursor.row, col), self.brush);
        }
    }

    pub fn clear(&mut self) {
        self.grid = Grid::empty(self.profile.dims);
        self.dirty = true;
    }

    pub fn stamp(&mut self, row: usize, col: usize, symbol: Symbol) -> Result<(), LevelError> {
        self.grid.set(row, col, symbol)?;
        self.dirty = true;
        Ok(())
    }

    fn put(&mut self, at: Position, symbol: Symbol) {
        if self.grid.get(at.row, at.col) != Some(symbol) && self.grid.set(at.row, at.col, symbol).is_ok() {
            self.dirty = true;
        }
    }

    // ── Output ──

    pub fn to_text(&self) -> String {
        text::to_text(&self.grid)
    }

    /// Accept the buffer as a level. Missing portal or ground is added and
    /// reported; the buffer itself is left as drawn.
    pub fn finish(&self, name: &str, description: &str) -> Result<(Level, Vec<Warning>), LevelError> {
        let repaired = repair(&rows::to_rows(&self.grid), &self.profile)?;
        let level = Level::new(name, repaired.grid).with_description(description);
        Ok((level, repaired.warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Dimensions;
    use crate::repair::exit_fallback;

    #[test]
    fn cursor_is_clamped() {
        let mut e = EditorBuffer::new(LevelProfile::LEDGER);
        e.move_by(-3, -3);
        assert_eq!(e.cursor(), Position::new(0, 0));
        e.move_by(100, 100);
        assert_eq!(e.cursor(), Position::new(10, 26));
        e.move_to(4, 200);
        assert_eq!(e.cursor(), Position::new(4, 26));
    }

    #[test]
    fn painting_marks_dirty() {
        let mut e = EditorBuffer::new(LevelProfile::ARCADE);
        assert!(!e.is_dirty());
        e.erase();
        assert!(!e.is_dirty(), "erasing an empty cell changes nothing");

        e.move_to(6, 0);
        e.fill_row();
        e.move_to(5, 11);
        e.set_brush(Symbol::Portal);
        e.paint();
        assert!(e.is_dirty());
        assert_eq!(e.grid().count(Symbol::Grass), 12);
        assert_eq!(e.grid().get(5, 11), Some(Symbol::Portal));

        e.mark_saved();
        assert!(!e.is_dirty());
    }

    #[test]
    fn brush_cycles_through_alphabet() {
        let mut e = EditorBuffer::new(LevelProfile::LEDGER);
        e.set_brush(Symbol::Portal);
        e.cycle_brush(true);
        assert_eq!(e.brush(), Symbol::ALL[0]);
        e.cycle_brush(false);
        assert_eq!(e.brush(), Symbol::Portal);
        for _ in 0..Symbol::ALL.len() {
            e.cycle_brush(true);
        }
        assert_eq!(e.brush(), Symbol::Portal);
    }

    #[test]
    fn finish_reports_playability_repairs_only() {
        let e = EditorBuffer::new(LevelProfile::LEDGER);
        let (level, warnings) = e.finish("blank", "nothing drawn").unwrap();
        assert_eq!(warnings.len(), 2);
        let at = exit_fallback(27);
        assert_eq!(level.grid.get(at.row, at.col), Some(Symbol::Portal));
        assert_eq!(level.grid.count(Symbol::Grass), 27);
        assert_eq!(level.description, "nothing drawn");
        assert!(e.grid().count(Symbol::Portal) == 0, "buffer keeps what was drawn");

        let mut drawn = EditorBuffer::new(LevelProfile::LEDGER);
        drawn.stamp(10, 0, Symbol::Steel).unwrap();
        drawn.stamp(9, 20, Symbol::Portal).unwrap();
        let (_, warnings) = drawn.finish("ok", "").unwrap();
        assert!(warnings.is_empty());
        assert!(drawn.stamp(11, 0, Symbol::Steel).is_err());
    }

    #[test]
    fn open_text_repairs_and_keeps_dimensions() {
        let src = "@\n\n===";
        let profile = LevelProfile::new(Dimensions::new(4, 3).unwrap(), crate::domain::symbol::ZeroMeaning::Block);
        let (e, warnings) = EditorBuffer::open_text(profile, src).unwrap();
        assert_eq!(e.to_text(), "@   \n    \n=== ");
        assert_eq!(warnings.len(), 3);

        assert!(matches!(
            EditorBuffer::open_text(profile, "@\n==="),
            Err(LevelError::RowCount { expected: 3, actual: 2 })
        ));
        assert!(EditorBuffer::from_grid(LevelProfile::LEDGER, Grid::empty(Dimensions::ARCADE)).is_err());
    }
}
