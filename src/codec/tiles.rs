/// Engine tile table: what the game engine instantiates for each symbol.
///
/// The engine builds one game object per non-empty cell from a list of
/// components and tags. Here that list is plain data keyed by symbol, so
/// the engine side only has to map `TileDescriptor` fields onto its own
/// component constructors. One-way: nothing is ever decoded from it.
///
/// Tags drive collision dispatch on the engine side:
///   `platform`, `coin`, `prize`, `danger`, `apple`, `enemy`, `portal`, `empty`.

use serde::Serialize;

use crate::domain::grid::Grid;
use crate::domain::symbol::{Symbol, SymbolTable, ZeroMeaning};

use super::rows;

pub const TILE_SIZE: u32 = 64;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    /// No physics body.
    None,
    /// Immovable collider.
    Static,
    /// Affected by gravity.
    Dynamic,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Patrol,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileDescriptor {
    pub symbol: char,
    pub sprite: Option<&'static str>,
    /// Collision area scale; `None` means no collision area.
    pub area: Option<f32>,
    pub body: Body,
    pub solid: bool,
    /// Pixel offset applied on spawn.
    pub offset: (i32, i32),
    pub behaviors: Vec<Behavior>,
    pub tags: Vec<&'static str>,
}

impl TileDescriptor {
    fn invisible(symbol: Symbol) -> Self {
        TileDescriptor {
            symbol: symbol.as_char(),
            sprite: None,
            area: None,
            body: Body::None,
            solid: false,
            offset: (0, 0),
            behaviors: vec![],
            tags: vec!["empty"],
        }
    }

    fn sprite(symbol: Symbol, sprite: &'static str, body: Body) -> Self {
        TileDescriptor {
            symbol: symbol.as_char(),
            sprite: Some(sprite),
            area: Some(1.0),
            body,
            solid: body == Body::Static,
            offset: (0, 0),
            behaviors: vec![],
            tags: vec![],
        }
    }

    fn tagged(mut self, tag: &'static str) -> Self {
        self.tags.push(tag);
        self
    }
}

pub fn descriptor(symbol: Symbol, table: &SymbolTable) -> TileDescriptor {
    match symbol {
        Symbol::Empty => TileDescriptor::invisible(symbol),
        Symbol::Grass => TileDescriptor::sprite(symbol, "grass", Body::Static).tagged("platform"),
        Symbol::Steel => TileDescriptor::sprite(symbol, "steel", Body::Static),
        Symbol::Zero => match table.zero() {
            ZeroMeaning::Block => TileDescriptor::sprite(symbol, "bag", Body::Static),
            ZeroMeaning::Blank => TileDescriptor::invisible(symbol),
        },
        Symbol::Coin => TileDescriptor {
            offset: (0, -9),
            ..TileDescriptor::sprite(symbol, "coin", Body::None).tagged("coin")
        },
        Symbol::Prize => TileDescriptor::sprite(symbol, "prize", Body::Static).tagged("prize"),
        Symbol::Spike => TileDescriptor::sprite(symbol, "spike", Body::Static).tagged("danger"),
        Symbol::Apple => TileDescriptor::sprite(symbol, "apple", Body::Dynamic).tagged("apple"),
        Symbol::Enemy => TileDescriptor {
            behaviors: vec![Behavior::Patrol],
            ..TileDescriptor::sprite(symbol, "ghosty", Body::Dynamic).tagged("enemy")
        },
        Symbol::Portal => TileDescriptor {
            area: Some(0.5),
            offset: (0, -12),
            ..TileDescriptor::sprite(symbol, "portal", Body::None).tagged("portal")
        },
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub tiles: Vec<TileDescriptor>,
}

impl TileConfig {
    /// Full table, one descriptor per symbol in alphabet order.
    pub fn for_table(table: &SymbolTable) -> Self {
        TileConfig {
            tile_width: TILE_SIZE,
            tile_height: TILE_SIZE,
            tiles: Symbol::ALL.iter().map(|s| descriptor(*s, table)).collect(),
        }
    }

    pub fn get(&self, symbol: char) -> Option<&TileDescriptor> {
        self.tiles.iter().find(|t| t.symbol == symbol)
    }
}

/// A level as the engine loads it: the row strings plus the tile table.
#[derive(Clone, Debug, Serialize)]
pub struct EngineLevel {
    pub map: Vec<String>,
    pub conf: TileConfig,
}

pub fn engine_level(grid: &Grid, table: &SymbolTable) -> EngineLevel {
    EngineLevel {
        map: rows::to_rows(grid),
        conf: TileConfig::for_table(table),
    }
}
