/// Reachability check: can the actor get from the spawn to the portal?
///
/// This is a coarse, grid-level model of the engine's movement. It never
/// changes a grid and never gates `repair`; callers use it to flag levels
/// that are probably unwinnable.
///
/// ## Movement model
///
///   - The actor occupies passable cells (not solid, not a hazard).
///   - A FOOTHOLD is a passable cell with a solid, non-hazard cell below it.
///   - From a foothold the actor rises straight up to `jump_height` cells,
///     then drifts sideways up to `jump_reach` cells, then falls straight
///     down until it lands on a foothold or drops out of the grid.
///   - Walking is the zero-height jump.
///   - The spawn is where an actor dropped at the top-left cell lands.
///
/// The exit counts as reached if any cell the actor passes through is a portal.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::domain::grid::{Grid, Position};
use crate::domain::symbol::{Symbol, SymbolTable};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ReachConfig {
    pub jump_height: usize,
    pub jump_reach: usize,
}

impl Default for ReachConfig {
    fn default() -> Self {
        ReachConfig { jump_height: 3, jump_reach: 3 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reachability {
    pub spawn: Option<Position>,
    pub exit_reachable: bool,
    /// Number of distinct footholds visited.
    pub footholds: usize,
}

struct Map<'a> {
    grid: &'a Grid,
    table: &'a SymbolTable,
}

impl Map<'_> {
    fn passable(&self, row: usize, col: usize) -> bool {
        self.grid.get(row, col).is_some_and(|s| self.table.is_passable(s))
    }

    fn supports(&self, row: usize, col: usize) -> bool {
        self.grid
            .get(row, col)
            .is_some_and(|s| self.table.is_solid(s) && !self.table.is_hazard(s))
    }

    fn is_foothold(&self, row: usize, col: usize) -> bool {
        self.passable(row, col) && self.supports(row + 1, col)
    }

    fn is_exit(&self, row: usize, col: usize) -> bool {
        self.grid.get(row, col) == Some(Symbol::EXIT)
    }

    /// Fall from a passable cell. Returns the landing foothold, if any,
    /// and whether the fall crossed the exit.
    fn fall(&self, mut row: usize, col: usize) -> (Option<Position>, bool) {
        let mut hit_exit = false;
        while self.passable(row, col) {
            hit_exit |= self.is_exit(row, col);
            if self.is_foothold(row, col) {
                return (Some(Position::new(row, col)), hit_exit);
            }
            row += 1;
        }
        (None, hit_exit)
    }
}

/// Where the actor lands when dropped at the top-left cell.
pub fn spawn_point(grid: &Grid, table: &SymbolTable) -> Option<Position> {
    Map { grid, table }.fall(0, 0).0
}

pub fn analyze(grid: &Grid, table: &SymbolTable, cfg: &ReachConfig) -> Reachability {
    let map = Map { grid, table };
    let (spawn, mut exit_reachable) = map.fall(0, 0);

    let Some(start) = spawn else {
        return Reachability { spawn: None, exit_reachable, footholds: 0 };
    };

    let mut seen: HashSet<Position> = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(at) = queue.pop_front() {
        for dy in 0..=cfg.jump_height {
            let Some(apex) = at.row.checked_sub(dy) else { break };
            if !map.passable(apex, at.col) {
                break; // head hits a ceiling
            }
            exit_reachable |= map.is_exit(apex, at.col);

            for dir in [-1isize, 1] {
                for dx in 1..=cfg.jump_reach as isize {
                    let col = at.col as isize + dir * dx;
                    if col < 0 || !map.passable(apex, col as usize) {
                        break;
                    }
                    let col = col as usize;
                    let (landing, crossed_exit) = map.fall(apex, col);
                    exit_reachable |= crossed_exit;
                    if let Some(p) = landing {
                        if seen.insert(p) {
                            queue.push_back(p);
                        }
                    }
                }
            }
        }
        if exit_reachable {
            break;
        }
    }

    Reachability { spawn, exit_reachable, footholds: seen.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::text;
    use crate::domain::grid::Dimensions;

    fn grid(rows: &[&str]) -> Grid {
        let dims = Dimensions { width: rows[0].len(), height: rows.len() };
        text::from_text(&rows.join("\n"), dims).unwrap()
    }

    #[test]
    fn flat_floor_reaches_exit() {
        let g = grid(&[
            "          ",
            "          ",
            "         @",
            "==========",
        ]);
        let r = analyze(&g, &SymbolTable::LEDGER, &ReachConfig::default());
        assert_eq!(r.spawn, Some(Position::new(2, 0)));
        assert!(r.exit_reachable);
    }

    #[test]
    fn wide_gap_blocks_exit() {
        let g = grid(&[
            "            ",
            "            ",
            "           @",
            "===      ===",
        ]);
        let r = analyze(&g, &SymbolTable::LEDGER, &ReachConfig::default());
        assert!(!r.exit_reachable);
        assert!(r.footholds >= 1);

        let long_jump = ReachConfig { jump_height: 3, jump_reach: 7 };
        assert!(analyze(&g, &SymbolTable::LEDGER, &long_jump).exit_reachable);
    }

    #[test]
    fn exit_on_high_ledge_needs_jump_height() {
        let g = grid(&[
            "      @",
            "    ===",
            "       ",
            "       ",
            "=======",
        ]);
        let low = ReachConfig { jump_height: 1, jump_reach: 3 };
        assert!(!analyze(&g, &SymbolTable::LEDGER, &low).exit_reachable);
        assert!(analyze(&g, &SymbolTable::LEDGER, &ReachConfig::default()).exit_reachable);
    }

    #[test]
    fn spikes_are_not_footholds() {
        let g = grid(&[
            "     ",
            "    @",
            "^^^^=",
        ]);
        assert_eq!(spawn_point(&g, &SymbolTable::LEDGER), None);
        let r = analyze(&g, &SymbolTable::LEDGER, &ReachConfig::default());
        assert!(!r.exit_reachable);
    }

    #[test]
    fn zero_is_floor_only_in_arcade() {
        let g = grid(&[
            "    ",
            "   @",
            "0000",
        ]);
        assert!(analyze(&g, &SymbolTable::ARCADE, &ReachConfig::default()).exit_reachable);
        assert!(!analyze(&g, &SymbolTable::LEDGER, &ReachConfig::default()).exit_reachable);
    }
}
