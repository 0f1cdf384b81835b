/// System instruction sent with every generation request.
///
/// The legend and dimensions come from the active profile. The layout rules
/// are guidance for the model only; `repair` enforces what is enforced.

use crate::domain::grid::{Dimensions, LevelProfile};
use crate::domain::symbol::Symbol;

const RULES: [&str; 10] = [
    "Always include at least one '@' (Portal) as the exit",
    "Make sure there's a way for the player to reach the portal",
    "Use '=' or '-' for platforms the player can stand on",
    "Place '$' (coins) strategically for collection",
    "Use '^' (spikes) sparingly for challenge",
    "Use '>' (enemies) moderately for difficulty",
    "Use '%' (prize blocks) and '#' (apples) for power-ups",
    "Leave ' ' (empty space) for areas the player can move through",
    "Consider gravity - platforms should support the player's movement",
    "Create interesting jumping challenges and paths",
];

/// `'c' (description)` for every symbol, comma separated.
pub fn legend(profile: &LevelProfile) -> String {
    Symbol::ALL
        .iter()
        .map(|s| format!("'{}' ({})", s.as_char(), profile.table.meaning(*s).description))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn system_prompt(profile: &LevelProfile) -> String {
    let Dimensions { width, height } = profile.dims;

    let mut out = String::from(
        "You are a level designer for a 2D platformer game. \
         Create a level based on the user's description.\n\nIMPORTANT RULES:\n",
    );
    out.push_str(&format!(
        "1. The level must be exactly {width} characters wide and {height} characters tall\n"
    ));
    out.push_str(&format!("2. Each row must be exactly {width} characters - COUNT CAREFULLY!\n"));
    out.push_str(&format!("3. Use only these symbols: {}\n", legend(profile)));
    for (i, rule) in RULES.iter().enumerate() {
        out.push_str(&format!("{}. {rule}\n", i + 4));
    }
    out.push_str(&format!(
        "\nCRITICAL: Each line must be EXACTLY {width} characters. Count each character carefully!\n\n\
         Return ONLY the level grid as {height} lines of exactly {width} characters each, \
         with no additional text, explanations, or formatting.\n\n\
         Example format (each line exactly {width} chars):\n"
    ));
    out.push_str(&example_rows(profile.dims).join("\n"));
    out
}

/// A small staircase level that fits `dims` exactly: ground along the
/// bottom, ledges rising two rows at a time, the portal on the last ledge.
pub fn example_rows(dims: Dimensions) -> Vec<String> {
    let (w, h) = (dims.width, dims.height);
    let mut cells = vec![vec![Symbol::Empty.as_char(); w]; h];
    let bottom = h - 1;
    let span = (w / 4).max(2);

    cells[bottom].fill(Symbol::Grass.as_char());

    let mut row = bottom;
    let mut start = 1;
    while row >= 3 && start + span < w {
        row -= 2;
        cells[row][start..start + span].fill(Symbol::Steel.as_char());
        cells[row - 1][start] = Symbol::Coin.as_char();
        start += span;
    }
    cells[bottom - 1][w / 2] = Symbol::Enemy.as_char();
    cells[row - 1][start - 1] = Symbol::Portal.as_char();

    cells.into_iter().map(|r| r.into_iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reach::{analyze, ReachConfig};
    use crate::repair::validate;

    #[test]
    fn prompt_states_dimensions_and_alphabet() {
        let p = system_prompt(&LevelProfile::LEDGER);
        assert!(p.contains("exactly 27 characters wide and 11 characters tall"));
        assert!(p.contains("'@' (Portal (level exit))"));
        assert!(p.contains("'0' (Blank placeholder"));
        assert!(p.contains("13. Create interesting jumping challenges"));

        let arcade = system_prompt(&LevelProfile::ARCADE);
        assert!(arcade.contains("'0' (Bag Block (solid block))"));
        assert!(arcade.contains("as 7 lines of exactly 12 characters"));
    }

    #[test]
    fn example_is_a_clean_winnable_level() {
        for profile in [LevelProfile::LEDGER, LevelProfile::ARCADE] {
            let rows = example_rows(profile.dims);
            assert_eq!(rows.len(), profile.height());
            let grid = validate(&rows, &profile).unwrap();
            let r = analyze(&grid, &profile.table, &ReachConfig::default());
            assert!(r.exit_reachable, "{rows:#?}");
        }
    }

    #[test]
    fn example_fits_minimal_grid() {
        let dims = Dimensions::new(3, 3).unwrap();
        let rows = example_rows(dims);
        assert_eq!(rows, vec!["   ", "@> ", "==="]);
    }
}
