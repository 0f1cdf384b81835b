/// Levels and games.
///
/// A `Level` is one accepted grid with a name. A `GameDraft` accumulates
/// levels client-side until it is published in one call; a `GameRecord` is
/// what the ledger reports back for a published game.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::grid::Grid;

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Amount in the chain's smallest currency unit.
/// Serialized as a decimal string so no JSON consumer rounds it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Wei(pub u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    /// Whole and fractional ether, trailing zeros trimmed (`1.5`, `0.001`, `2`).
    pub fn to_ether_string(self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        if frac == 0 {
            return whole.to_string();
        }
        let digits = format!("{frac:018}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }

    pub fn as_ether_f64(self) -> f64 {
        self.0 as f64 / WEI_PER_ETHER as f64
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Wei {
    type Err = std::num::ParseIntError;

    /// Decimal integer wei, surrounding whitespace allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Wei)
    }
}

impl From<Wei> for String {
    fn from(w: Wei) -> String {
        w.0.to_string()
    }
}

impl TryFrom<String> for Wei {
    type Error = std::num::ParseIntError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub name: String,
    pub description: String,
    pub grid: Grid,
}

impl Level {
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Level { name: name.into(), description: String::new(), grid }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A game being authored. Nothing is persisted until it is published.
#[derive(Clone, Debug, Default)]
pub struct GameDraft {
    pub name: String,
    pub description: String,
    pub cost_of_play: Wei,
    pub levels: Vec<Level>,
}

impl GameDraft {
    pub fn new(name: impl Into<String>, cost_of_play: Wei) -> Self {
        GameDraft {
            name: name.into(),
            cost_of_play,
            ..GameDraft::default()
        }
    }

    pub fn push_level(&mut self, level: Level) {
        self.levels.push(level);
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// A published game as reported by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: u64,
    pub game_name: String,
    pub owner: String,
    pub levels_count: usize,
    pub game_address: String,
    pub cost_of_play: Wei,
    pub prize_pool: Wei,
    pub total_players: u64,
}

impl GameRecord {
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_level_count(self.levels_count)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({} levels, {}). Prize pool: {} MONAD. Cost: {} MONAD.",
            self.game_name,
            self.levels_count,
            self.difficulty(),
            self.prize_pool.to_ether_string(),
            self.cost_of_play.to_ether_string(),
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_level_count(levels: usize) -> Self {
        match levels {
            0..=2 => Difficulty::Easy,
            3..=4 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(s)
    }
}

/// `0x1234...abcd`. Strings too short to abbreviate are returned unchanged.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Dimensions;

    #[test]
    fn wei_to_ether() {
        assert_eq!(Wei(0).to_ether_string(), "0");
        assert_eq!(Wei(2 * WEI_PER_ETHER).to_ether_string(), "2");
        assert_eq!(Wei(WEI_PER_ETHER + WEI_PER_ETHER / 2).to_ether_string(), "1.5");
        assert_eq!(Wei(1_000_000_000_000_000).to_ether_string(), "0.001");
        assert_eq!(" 42 ".parse::<Wei>().unwrap(), Wei(42));
        assert!("1.5".parse::<Wei>().is_err());
        assert!("-1".parse::<Wei>().is_err());
    }

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(Difficulty::from_level_count(1), Difficulty::Easy);
        assert_eq!(Difficulty::from_level_count(2), Difficulty::Easy);
        assert_eq!(Difficulty::from_level_count(3), Difficulty::Medium);
        assert_eq!(Difficulty::from_level_count(4), Difficulty::Medium);
        assert_eq!(Difficulty::from_level_count(5), Difficulty::Hard);
    }

    #[test]
    fn draft_accumulates_levels() {
        let mut draft = GameDraft::new("Sky Run", Wei(10));
        draft.push_level(Level::new("one", Grid::empty(Dimensions::LEDGER)));
        draft.push_level(Level::new("two", Grid::empty(Dimensions::LEDGER)).with_description("harder"));
        assert_eq!(draft.level_count(), 2);
        assert_eq!(draft.levels[1].description, "harder");
    }

    #[test]
    fn addresses_are_shortened() {
        assert_eq!(
            short_address("0xf8Aa9B30d26aE9185D7739e31280f29368CDfCBA"),
            "0xf8Aa...fCBA"
        );
        assert_eq!(short_address("0x1234"), "0x1234");
    }
}
