/// JSON preset files for the arcade deployment.
///
/// ```json
/// { "GameKey": { "Levels": { "Levels": [["row", ...], ...], "LevelsCount": 1 } } }
/// ```
///
/// Each level's dimensions come from its own rows; every row of a level must
/// have the same width. `LevelsCount` must agree with the list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::grid::{Dimensions, Grid};
use crate::error::LevelError;

use super::rows;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetLevels {
    #[serde(rename = "LevelsCount")]
    pub levels_count: usize,
    #[serde(rename = "Levels")]
    pub levels: Vec<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetGame {
    #[serde(rename = "Levels")]
    pub levels: PresetLevels,
}

impl PresetGame {
    pub fn from_grids(grids: &[Grid]) -> Self {
        let levels: Vec<Vec<String>> = grids.iter().map(rows::to_rows).collect();
        PresetGame {
            levels: PresetLevels { levels_count: levels.len(), levels },
        }
    }

    /// Decode every level, checking the declared count first.
    pub fn grids(&self) -> Result<Vec<Grid>, LevelError> {
        let declared = self.levels.levels_count;
        let actual = self.levels.levels.len();
        if declared != actual {
            return Err(LevelError::malformed(
                0,
                None,
                format!("LevelsCount is {declared} but {actual} levels are listed"),
            ));
        }
        self.levels.levels.iter().map(|level| decode_level(level)).collect()
    }
}

fn decode_level(level: &[String]) -> Result<Grid, LevelError> {
    let width = level.first().map(|r| r.chars().count()).unwrap_or(0);
    let dims = Dimensions::new(width, level.len())?;
    rows::from_rows(level, dims)
}

/// All games in one preset file, keyed by game key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetFile(pub BTreeMap<String, PresetGame>);

impl PresetFile {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn game(&self, key: &str) -> Option<&PresetGame> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, game: PresetGame) {
        self.0.insert(key.into(), game);
    }
}

pub fn parse_preset(json: &str) -> Result<PresetFile, LevelError> {
    Ok(serde_json::from_str(json)?)
}

pub fn to_json(file: &PresetFile) -> Result<String, LevelError> {
    Ok(serde_json::to_string_pretty(file)?)
}

const FALLBACK_ROWS: [&str; 7] = [
    "    0       ",
    "   --       ",
    "       $$   ",
    " %    ===   ",
    "            ",
    "   ^^  > = @",
    "============",
];

/// Built-in arcade level, used when a preset cannot be loaded.
pub fn fallback() -> Grid {
    match rows::from_rows(&FALLBACK_ROWS, Dimensions::ARCADE) {
        Ok(grid) => grid,
        Err(e) => {
            tracing::error!(error = %e, "built-in fallback level does not decode, using an empty grid");
            Grid::empty(Dimensions::ARCADE)
        }
    }
}

/// Levels of `key`, or the fallback level if the file or key is unusable.
pub fn load_or_fallback(json: &str, key: &str) -> Vec<Grid> {
    let loaded = parse_preset(json).and_then(|file| match file.game(key) {
        Some(game) => game.grids(),
        None => Err(LevelError::malformed(0, None, format!("game key {key:?} not found"))),
    });
    match loaded {
        Ok(grids) if !grids.is_empty() => {
            tracing::info!(key, levels = grids.len(), "loaded preset levels");
            grids
        }
        Ok(_) => {
            tracing::warn!(key, "preset has no levels, using fallback level");
            vec![fallback()]
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to load preset, using fallback level");
            vec![fallback()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::Symbol;

    const FILE: &str = r#"{
        "forest": { "Levels": { "LevelsCount": 2, "Levels": [
            ["@  ", "  $", "==="],
            ["    0       ", "   --       ", "       $$   ", " %    ===   ", "            ", "   ^^  > = @", "============"]
        ] } }
    }"#;

    #[test]
    fn parses_games_by_key() {
        let file = parse_preset(FILE).unwrap();
        assert_eq!(file.keys().collect::<Vec<_>>(), vec!["forest"]);
        let grids = file.game("forest").unwrap().grids().unwrap();
        assert_eq!(grids[0].dims(), Dimensions { width: 3, height: 3 });
        assert_eq!(grids[1].dims(), Dimensions::ARCADE);
        assert_eq!(grids[1], fallback());
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let json = FILE.replace("\"LevelsCount\": 2", "\"LevelsCount\": 3");
        let file = parse_preset(&json).unwrap();
        assert!(matches!(file.game("forest").unwrap().grids(), Err(LevelError::MalformedLevel { .. })));
    }

    #[test]
    fn bad_json_is_a_preset_error() {
        assert!(matches!(parse_preset("{ nope"), Err(LevelError::Preset(_))));
    }

    #[test]
    fn fallback_on_missing_key() {
        let grids = load_or_fallback(FILE, "desert");
        assert_eq!(grids, vec![fallback()]);
        assert_eq!(fallback().get(5, 11), Some(Symbol::Portal));
    }

    #[test]
    fn fallback_rows_decode_and_are_playable() {
        assert!(rows::from_rows(&FALLBACK_ROWS, Dimensions::ARCADE).is_ok());
        let repaired = crate::repair::repair(&FALLBACK_ROWS, &crate::domain::grid::LevelProfile::ARCADE).unwrap();
        assert!(repaired.is_clean());
        assert_eq!(repaired.grid, fallback());
    }

    #[test]
    fn written_file_reads_back() {
        let mut file = PresetFile::default();
        file.insert("arcade", PresetGame::from_grids(&[fallback()]));
        let json = to_json(&file).unwrap();
        assert!(json.contains("\"LevelsCount\": 1"));
        assert_eq!(parse_preset(&json).unwrap(), file);
    }
}
