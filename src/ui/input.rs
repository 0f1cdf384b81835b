/// Keyboard input for the editor.
///
/// Terminal key events are translated into `EditorAction`s. Every Press and
/// Repeat event counts, so holding an arrow key keeps the cursor moving at
/// the terminal's repeat rate. Release events are ignored.
///
/// Key map:
///   - arrows / `hjkl`          move the cursor
///   - any level symbol         select it as the brush and paint
///   - space                    paint with the current brush
///   - `x` / Delete / Backspace erase
///   - `f`                      fill the cursor row with the brush
///   - Tab / Shift-Tab          cycle the brush
///   - `r`                      reachability check
///   - `C`                      clear the grid
///   - Ctrl-S                   save
///   - `q` / Esc / Ctrl-C       quit

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::symbol::Symbol;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EditorAction {
    Move { d_row: isize, d_col: isize },
    /// Select `Symbol` as brush and paint it at the cursor.
    Place(Symbol),
    Paint,
    Erase,
    FillRow,
    NextBrush,
    PrevBrush,
    CheckReach,
    Clear,
    Save,
    Quit,
}

pub fn action_for(key: KeyEvent) -> Option<EditorAction> {
    use EditorAction::*;

    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Save),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Move { d_row: -1, d_col: 0 },
        KeyCode::Down | KeyCode::Char('j') => Move { d_row: 1, d_col: 0 },
        KeyCode::Left | KeyCode::Char('h') => Move { d_row: 0, d_col: -1 },
        KeyCode::Right | KeyCode::Char('l') => Move { d_row: 0, d_col: 1 },
        KeyCode::Char(' ') => Paint,
        KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => Erase,
        KeyCode::Char('f') => FillRow,
        KeyCode::Tab => NextBrush,
        KeyCode::BackTab => PrevBrush,
        KeyCode::Char('r') => CheckReach,
        KeyCode::Char('C') => Clear,
        KeyCode::Char('q') | KeyCode::Esc => Quit,
        KeyCode::Char(c) => Place(Symbol::from_char(c)?),
        _ => return None,
    };
    Some(action)
}

pub struct InputState {
    /// Actions collected by the most recent `drain_events` call, in order.
    actions: Vec<EditorAction>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { actions: Vec::with_capacity(8) }
    }

    /// Wait up to `timeout` for the first event, then drain everything
    /// pending without blocking.
    pub fn drain_events(&mut self, timeout: Duration) -> io::Result<&[EditorAction]> {
        self.actions.clear();

        let mut wait = timeout;
        while event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = action_for(key) {
                    self.actions.push(action);
                }
            }
            wait = Duration::ZERO;
        }

        Ok(&self.actions)
    }
}

impl Default for InputState {
    fn default() -> Self {
        InputState::new()
    }
}
