/// Level symbols and their meanings.
///
/// A symbol is one character of the closed level alphabet. What a symbol
/// *means* is answered by a `SymbolTable`, not by the symbol itself, because
/// `0` has two meanings depending on the deployment (see `ZeroMeaning`).
/// Tile semantics are centralized here.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Symbol {
    #[default]
    Empty,  // ' '
    Grass,  // '=' solid ground platform
    Steel,  // '-' solid metal platform
    Zero,   // '0' bag block or blank placeholder, see ZeroMeaning
    Coin,   // '$'
    Prize,  // '%' hit from below for a power-up
    Spike,  // '^'
    Apple,  // '#' power-up pickup
    Enemy,  // '>' patrolling hazard
    Portal, // '@' level exit
}

impl Symbol {
    pub const ALL: [Symbol; 10] = [
        Symbol::Empty,
        Symbol::Grass,
        Symbol::Steel,
        Symbol::Zero,
        Symbol::Coin,
        Symbol::Prize,
        Symbol::Spike,
        Symbol::Apple,
        Symbol::Enemy,
        Symbol::Portal,
    ];

    /// The exit every playable grid must contain.
    pub const EXIT: Symbol = Symbol::Portal;

    /// Symbol used to lay a floor when a grid has nothing to stand on.
    pub const PRIMARY_GROUND: Symbol = Symbol::Grass;

    pub fn from_char(c: char) -> Option<Symbol> {
        let s = match c {
            ' ' => Symbol::Empty,
            '=' => Symbol::Grass,
            '-' => Symbol::Steel,
            '0' => Symbol::Zero,
            '$' => Symbol::Coin,
            '%' => Symbol::Prize,
            '^' => Symbol::Spike,
            '#' => Symbol::Apple,
            '>' => Symbol::Enemy,
            '@' => Symbol::Portal,
            _ => return None,
        };
        Some(s)
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::Empty  => ' ',
            Symbol::Grass  => '=',
            Symbol::Steel  => '-',
            Symbol::Zero   => '0',
            Symbol::Coin   => '$',
            Symbol::Prize  => '%',
            Symbol::Spike  => '^',
            Symbol::Apple  => '#',
            Symbol::Enemy  => '>',
            Symbol::Portal => '@',
        }
    }
}

/// What `0` stands for in a given deployment.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroMeaning {
    /// Solid bag block (arcade presets).
    Block,
    /// Explicit empty placeholder used in persisted rows (ledger).
    Blank,
}

/// Everything callers need to know about one symbol.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileMeaning {
    pub label: &'static str,
    /// Legend line used in the generation prompt.
    pub description: &'static str,
    pub solid: bool,
    /// Ground, metal or block: something an actor spawns onto.
    pub surface: bool,
    pub hazard: bool,
    pub collectible: bool,
    pub movable: bool,
    pub exit: bool,
}

impl TileMeaning {
    const fn empty(label: &'static str, description: &'static str) -> Self {
        TileMeaning {
            label,
            description,
            solid: false,
            surface: false,
            hazard: false,
            collectible: false,
            movable: false,
            exit: false,
        }
    }
}

/// Pure lookup from symbol to meaning for one deployment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SymbolTable {
    zero: ZeroMeaning,
}

impl SymbolTable {
    pub const LEDGER: SymbolTable = SymbolTable { zero: ZeroMeaning::Blank };
    pub const ARCADE: SymbolTable = SymbolTable { zero: ZeroMeaning::Block };

    pub const fn new(zero: ZeroMeaning) -> Self {
        SymbolTable { zero }
    }

    pub fn zero(&self) -> ZeroMeaning {
        self.zero
    }

    pub fn meaning(&self, symbol: Symbol) -> TileMeaning {
        match symbol {
            Symbol::Empty => TileMeaning::empty("empty", "Empty space"),
            Symbol::Grass => TileMeaning {
                solid: true,
                surface: true,
                ..TileMeaning::empty("grass", "Grass Platform (solid ground)")
            },
            Symbol::Steel => TileMeaning {
                solid: true,
                surface: true,
                ..TileMeaning::empty("steel", "Steel Platform (solid metal)")
            },
            Symbol::Zero => match self.zero {
                ZeroMeaning::Block => TileMeaning {
                    solid: true,
                    surface: true,
                    ..TileMeaning::empty("bag", "Bag Block (solid block)")
                },
                ZeroMeaning::Blank => {
                    TileMeaning::empty("blank", "Blank placeholder (empty, no collision)")
                }
            },
            Symbol::Coin => TileMeaning {
                collectible: true,
                ..TileMeaning::empty("coin", "Coin (collectible)")
            },
            Symbol::Prize => TileMeaning {
                solid: true,
                ..TileMeaning::empty("prize", "Prize Block (hit for power-ups)")
            },
            Symbol::Spike => TileMeaning {
                solid: true,
                hazard: true,
                ..TileMeaning::empty("spike", "Spike (dangerous)")
            },
            Symbol::Apple => TileMeaning {
                collectible: true,
                ..TileMeaning::empty("apple", "Apple (power-up)")
            },
            Symbol::Enemy => TileMeaning {
                hazard: true,
                movable: true,
                ..TileMeaning::empty("enemy", "Enemy (moving threat)")
            },
            Symbol::Portal => TileMeaning {
                exit: true,
                ..TileMeaning::empty("portal", "Portal (level exit)")
            },
        }
    }

    /// Meaning of a raw character; `None` for anything outside the alphabet.
    pub fn meaning_of(&self, c: char) -> Option<TileMeaning> {
        Symbol::from_char(c).map(|s| self.meaning(s))
    }

    pub fn is_solid(&self, symbol: Symbol) -> bool {
        self.meaning(symbol).solid
    }

    pub fn is_surface(&self, symbol: Symbol) -> bool {
        self.meaning(symbol).surface
    }

    pub fn is_hazard(&self, symbol: Symbol) -> bool {
        self.meaning(symbol).hazard
    }

    /// Can an actor occupy this cell without dying or being blocked?
    pub fn is_passable(&self, symbol: Symbol) -> bool {
        let m = self.meaning(symbol);
        !m.solid && !m.hazard
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::LEDGER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_symbol_is_empty() {
        assert_eq!(Symbol::default(), Symbol::Empty);
        assert_eq!(Symbol::default().as_char(), ' ');
    }

    #[test]
    fn alphabet_is_closed() {
        for s in Symbol::ALL {
            assert_eq!(Symbol::from_char(s.as_char()), Some(s));
        }
        for c in ['!', 'a', ',', '[', ']', '"', '\t'] {
            assert_eq!(Symbol::from_char(c), None);
            assert!(SymbolTable::LEDGER.meaning_of(c).is_none());
        }
    }

    #[test]
    fn zero_depends_on_deployment() {
        let block = SymbolTable::ARCADE.meaning(Symbol::Zero);
        assert!(block.solid && block.surface);
        assert_eq!(block.label, "bag");

        let blank = SymbolTable::LEDGER.meaning(Symbol::Zero);
        assert!(!blank.solid && !blank.surface);
        assert_eq!(blank.label, "blank");
    }

    #[test]
    fn surfaces_are_ground_metal_block_only() {
        let t = SymbolTable::ARCADE;
        let surfaces: Vec<char> = Symbol::ALL
            .iter()
            .filter(|s| t.is_surface(**s))
            .map(|s| s.as_char())
            .collect();
        assert_eq!(surfaces, vec!['=', '-', '0']);
        // Solid but not a surface.
        assert!(t.is_solid(Symbol::Prize) && !t.is_surface(Symbol::Prize));
        assert!(t.is_solid(Symbol::Spike) && t.is_hazard(Symbol::Spike));
    }

    #[test]
    fn exit_and_pickups() {
        let t = SymbolTable::LEDGER;
        assert!(t.meaning(Symbol::EXIT).exit);
        assert!(t.meaning(Symbol::Coin).collectible);
        assert!(t.meaning(Symbol::Apple).collectible);
        assert!(t.meaning(Symbol::Enemy).movable);
        assert!(!t.is_passable(Symbol::Enemy));
        assert!(t.is_passable(Symbol::Portal));
    }
}
