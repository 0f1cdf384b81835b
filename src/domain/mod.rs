/// Core data model: symbols, grids, levels and games.

pub mod grid;
pub mod level;
pub mod reach;
pub mod symbol;
