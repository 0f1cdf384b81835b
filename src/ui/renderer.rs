/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each level cell is drawn two terminal columns wide so the grid keeps a
/// roughly square aspect. `preview_lines` renders the same glyphs as plain
/// styled text for non-interactive output.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor, Stylize},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::{Grid, Position};
use crate::domain::reach::Reachability;
use crate::domain::symbol::{Symbol, SymbolTable, ZeroMeaning};
use crate::editor::EditorBuffer;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Cell::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Glyphs ──

/// Terminal columns per level cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const CURSOR_BG: Color = Color::Rgb { r: 90, g: 90, b: 150 };

/// Two glyphs plus colors for one level cell.
pub fn tile_style(symbol: Symbol, table: &SymbolTable) -> (char, char, Color, Color) {
    match symbol {
        Symbol::Empty => (' ', ' ', Color::Reset, Color::Reset),
        Symbol::Grass => ('▀', '▀', Color::Rgb { r: 90, g: 200, b: 70 }, Color::Rgb { r: 110, g: 70, b: 35 }),
        Symbol::Steel => ('█', '█', Color::Rgb { r: 150, g: 150, b: 160 }, Color::Rgb { r: 80, g: 80, b: 90 }),
        Symbol::Zero => match table.zero() {
            ZeroMeaning::Block => ('▓', '▓', Color::Rgb { r: 200, g: 160, b: 90 }, Color::Rgb { r: 120, g: 90, b: 40 }),
            ZeroMeaning::Blank => ('·', ' ', Color::DarkGrey, Color::Reset),
        },
        Symbol::Coin => ('$', ' ', Color::Rgb { r: 255, g: 215, b: 0 }, Color::Reset),
        Symbol::Prize => ('?', '?', Color::Black, Color::Rgb { r: 230, g: 150, b: 40 }),
        Symbol::Spike => ('▲', '▲', Color::Rgb { r: 230, g: 60, b: 60 }, Color::Reset),
        Symbol::Apple => ('●', ' ', Color::Rgb { r: 220, g: 40, b: 40 }, Color::Reset),
        Symbol::Enemy => ('◄', '►', Color::Rgb { r: 200, g: 200, b: 255 }, Color::Reset),
        Symbol::Portal => ('◖', '◗', Color::Rgb { r: 190, g: 90, b: 255 }, Color::Rgb { r: 50, g: 20, b: 80 }),
    }
}

/// The grid as styled lines, one per row, for printing to a normal terminal.
/// `mark` gets a highlighted background (e.g. the spawn point).
pub fn preview_lines(grid: &Grid, table: &SymbolTable, mark: Option<Position>) -> Vec<String> {
    grid.rows()
        .enumerate()
        .map(|(y, row)| {
            let mut line = String::new();
            for (x, symbol) in row.iter().enumerate() {
                let (c0, c1, fg, mut bg) = tile_style(*symbol, table);
                if mark == Some(Position::new(y, x)) {
                    bg = CURSOR_BG;
                }
                let bg = if bg == Color::Reset { Cell::BASE_BG } else { bg };
                let glyph: String = [c0, c1].iter().collect();
                line.push_str(&glyph.with(fg).on(bg).to_string());
            }
            line
        })
        .collect()
}

// ── Editor screen model ──

pub struct EditorView<'a> {
    pub buffer: &'a EditorBuffer,
    pub title: &'a str,
    pub message: &'a str,
    pub reach: Option<&'a Reachability>,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render_editor(&mut self, view: &EditorView<'_>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_editor(view);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Compose: build front buffer content ──

    fn compose_editor(&mut self, view: &EditorView<'_>) {
        let buffer = view.buffer;
        let grid = buffer.grid();
        let table = buffer.profile().table;
        let cursor = buffer.cursor();

        // ── HUD row ──
        let hud = format!(
            " {}{}  {}x{}  cursor {},{}  brush '{}' {} ",
            view.title,
            if buffer.is_dirty() { " *" } else { "" },
            grid.width(),
            grid.height(),
            cursor.row + 1,
            cursor.col + 1,
            buffer.brush().as_char(),
            table.meaning(buffer.brush()).label,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        for (y, row) in grid.rows().enumerate() {
            for (x, symbol) in row.iter().enumerate() {
                let (c0, c1, fg, mut bg) = tile_style(*symbol, &table);
                if cursor == Position::new(y, x) {
                    bg = CURSOR_BG;
                }
                let col = 1 + x * CELL_W;
                self.front.set(col, MAP_ROW + y, Cell::new(c0, fg, bg));
                self.front.set(col + 1, MAP_ROW + y, Cell::new(c1, fg, bg));
            }
        }
        let below = MAP_ROW + grid.height() + 1;

        // ── Palette ──
        let mut x = 1;
        for symbol in Symbol::ALL {
            let (c0, c1, fg, bg) = tile_style(symbol, &table);
            let selected = symbol == buffer.brush();
            let key_fg = if selected { Color::Black } else { Color::DarkGrey };
            let key_bg = if selected { MSG_BG } else { Color::Reset };
            let key = if symbol == Symbol::Empty { '␣' } else { symbol.as_char() };
            self.front.set(x, below, Cell::new(key, key_fg, key_bg));
            self.front.set(x + 1, below, Cell::new(c0, fg, bg));
            self.front.set(x + 2, below, Cell::new(c1, fg, bg));
            x += 4;
        }

        // ── Reachability ──
        if let Some(r) = view.reach {
            let (text, fg) = match (r.spawn, r.exit_reachable) {
                (None, _) => ("no spawn: the player falls out of the level".to_string(), Color::Red),
                (Some(_), true) => (format!("portal reachable ({} footholds explored)", r.footholds), Color::Green),
                (Some(_), false) => (format!("portal NOT reachable ({} footholds explored)", r.footholds), Color::Red),
            };
            self.front.put_str(1, below + 2, &text, fg, Color::Reset);
        }

        // ── Message bar ──
        let msg_row = below + 4;
        if !view.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" {} ", view.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help = " ←↑↓→/hjkl Move  symbol Place  ␣ Paint  x Erase  f Fill  Tab Brush  r Reach  C Clear  ^S Save  q Quit";
        self.front.put_str(0, msg_row + 2, help, Color::DarkGrey, Color::Reset);
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, never ResetColor: it would fall back to the
        // terminal's own background.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}
