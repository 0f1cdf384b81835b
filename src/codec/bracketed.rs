/// Legacy bracketed encoding of a list of levels:
///
///   ```text
///   [["row","row",...],["row",...]]
///   ```
///
/// Parsing finds balanced top-level `[...]` groups inside the outer pair,
/// then splits each group on `,` and strips one pair of surrounding quotes
/// from each row. Plain comma splitting is safe because the level alphabet
/// contains none of `,`, `[`, `]` or `"`.

use crate::domain::grid::{Dimensions, Grid};
use crate::error::LevelError;

use super::rows;

pub fn to_bracketed<S: AsRef<str>>(levels: &[Vec<S>]) -> String {
    let groups: Vec<String> = levels
        .iter()
        .map(|level| {
            let quoted: Vec<String> = level.iter().map(|r| format!("\"{}\"", r.as_ref())).collect();
            format!("[{}]", quoted.join(","))
        })
        .collect();
    format!("[{}]", groups.join(","))
}

pub fn parse_bracketed(text: &str) -> Result<Vec<Vec<String>>, LevelError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| LevelError::malformed(0, None, "levels must be wrapped in [ ]"))?;

    let mut levels = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, ch) in inner.char_indices() {
        match ch {
            '[' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ']' => {
                if depth == 0 {
                    return Err(LevelError::malformed(levels.len(), None, "unbalanced ']'"));
                }
                depth -= 1;
                if depth == 0 {
                    levels.push(split_group(&inner[start..i]));
                }
            }
            ',' if depth == 0 => {}
            c if depth == 0 && c.is_whitespace() => {}
            c if depth == 0 => {
                return Err(LevelError::malformed(
                    levels.len(),
                    None,
                    format!("unexpected {c:?} between levels"),
                ));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(LevelError::malformed(levels.len(), None, "unbalanced '['"));
    }
    Ok(levels)
}

fn split_group(group: &str) -> Vec<String> {
    if group.trim().is_empty() {
        return Vec::new();
    }
    group
        .split(',')
        .map(|row| {
            let row = row.trim();
            let row = row.strip_prefix('"').unwrap_or(row);
            let row = row.strip_suffix('"').unwrap_or(row);
            row.to_string()
        })
        .collect()
}

/// Parse and decode every level into a grid of the given dimensions.
pub fn parse_levels(text: &str, dims: Dimensions) -> Result<Vec<Grid>, LevelError> {
    parse_bracketed(text)?
        .iter()
        .map(|level| rows::from_rows(level.as_slice(), dims))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<Vec<String>> {
        vec![
            vec!["000@".into(), "0$00".into(), "====".into()],
            vec!["  @ ".into(), " >  ".into(), "-=-=".into()],
        ]
    }

    #[test]
    fn bracketed_round_trip() {
        let l = levels();
        let text = to_bracketed(&l);
        assert_eq!(text, r#"[["000@","0$00","===="],["  @ "," >  ","-=-="]]"#);
        assert_eq!(parse_bracketed(&text).unwrap(), l);
    }

    #[test]
    fn tolerates_whitespace_between_tokens() {
        let text = "[ [ \"000@\" , \"0$00\",\"====\" ] ,\n [\"  @ \",\" >  \",\"-=-=\"] ]";
        assert_eq!(parse_bracketed(text).unwrap(), levels());
    }

    #[test]
    fn decodes_into_grids() {
        let text = to_bracketed(&levels());
        let dims = Dimensions { width: 4, height: 3 };
        let grids = parse_levels(&text, dims).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(rows::to_rows(&grids[1]), levels()[1]);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(parse_bracketed("[]").unwrap(), Vec::<Vec<String>>::new());
        assert_eq!(parse_bracketed("[[]]").unwrap(), vec![Vec::<String>::new()]);
    }

    #[test]
    fn unbalanced_or_stray_text_is_malformed() {
        assert!(parse_bracketed("[[\"a\"]").is_err());
        assert!(parse_bracketed("[[\"a\"]]]").is_err());
        assert!(parse_bracketed("[[\"a\"] x [\"b\"]]").is_err());
        assert!(parse_bracketed("\"a\",\"b\"").is_err());
    }
}
