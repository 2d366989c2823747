//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Build the next frame into `front` buffer (array of Cell)
//!   2. Compare each cell with `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. All commands are batched with `queue!`, flushed once at the end
//!   5. Swap front/back
//!
//! Every game cell is two terminal columns wide. Characters get a
//! doubled glyph, word tiles a two-letter abbreviation.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use meepo::domain::actor::{Actor, Kind};
use meepo::domain::tile::{Noun, Property};
use meepo::sim::world::{GameState, Outcome};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, so the terminal default
    /// never shows through between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
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

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
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

const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// Columns between the map and the rule panel.
const PANEL_GAP: usize = 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const FLOOR_BG: Color = Color::Rgb { r: 30, g: 30, b: 45 };
const SUBJECT_FG: Color = Color::Rgb { r: 230, g: 110, b: 180 };
const ATTRIBUTE_FG: Color = Color::Rgb { r: 240, g: 170, b: 60 };
const LINK_FG: Color = Color::Rgb { r: 230, g: 230, b: 230 };
const WORD_BG: Color = Color::Rgb { r: 45, g: 35, b: 55 };

fn noun_glyph(noun: Noun) -> (char, Color) {
    match noun {
        Noun::Meepo => ('@', Color::Rgb { r: 250, g: 250, b: 250 }),
        Noun::Wall => ('#', Color::Rgb { r: 140, g: 140, b: 150 }),
        Noun::Rock => ('o', Color::Rgb { r: 190, g: 140, b: 90 }),
        Noun::Flag => ('!', Color::Rgb { r: 250, g: 220, b: 80 }),
        Noun::Bush => ('*', Color::Rgb { r: 90, g: 200, b: 90 }),
    }
}

fn abbrev(word: &str) -> [char; 2] {
    let mut it = word.chars().map(|c| c.to_ascii_uppercase());
    [it.next().unwrap_or(' '), it.next().unwrap_or(' ')]
}

/// Two terminal cells for one actor.
fn glyph(actor: &Actor, is_player: bool) -> ([char; 2], Color, Color) {
    match actor.kind {
        Kind::Character(noun) => {
            let (ch, fg) = noun_glyph(noun);
            let bg = if is_player { Color::Rgb { r: 60, g: 60, b: 120 } } else { FLOOR_BG };
            ([ch, ch], fg, bg)
        }
        Kind::Subject(noun) => (abbrev(noun.keyword()), SUBJECT_FG, WORD_BG),
        // "isPush" → "PU"
        Kind::Attribute(prop) => (abbrev(prop.keyword().trim_start_matches("is")), ATTRIBUTE_FG, WORD_BG),
        Kind::Link => (['I', 'S'], LINK_FG, WORD_BG),
    }
}

// ── Status line ──

/// Status text and its colour for the current state.
fn status_line(w: &GameState, last_level: bool) -> (String, Color) {
    match w.outcome {
        Some(Outcome::Won) if last_level => ("All levels clear!  q to quit".into(), Color::Green),
        Some(Outcome::Won) => ("Level clear!".into(), Color::Green),
        Some(Outcome::Lost) => ("You lost — undo (z)".into(), Color::Red),
        Some(Outcome::Quit) => ("Bye".into(), Color::DarkGrey),
        None if w.player.is_none() => ("Nothing is You — undo (z) or restart (r)".into(), Color::Yellow),
        None => ("Playing".into(), Color::White),
    }
}

fn rule_color(prop: Property) -> Color {
    match prop {
        Property::You => Color::Cyan,
        Property::Victory => Color::Green,
        Property::Lose => Color::Red,
        Property::Push | Property::Stop => Color::White,
    }
}

// ── Renderer ──

/// Front-end context drawn around the board.
pub struct Hud {
    /// Zero-based position of the level in the run.
    pub index: usize,
    pub total: usize,
    /// Transient note from the last command (rule formed, nothing to undo).
    pub message: String,
}

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
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Force the next frame to repaint every cell (e.g. after a level change).
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, w: &GameState, hud: &Hud) -> io::Result<()> {
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
        self.compose_hud(w, hud);
        self.compose_map(w);
        self.compose_rules(w);
        self.compose_footer(w, hud);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }
                if need_move {
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
            }
            // Row wrap is never relied on.
            need_move = true;
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &GameState, hud: &Hud) {
        let text = format!(
            " {}/{}  {}   moves: {}   undo: {}",
            hud.index + 1,
            hud.total,
            w.name,
            w.moves,
            w.history.len(),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &text, Color::White, HUD_BG);
    }

    fn compose_map(&mut self, w: &GameState) {
        for gy in 0..w.height() {
            for gx in 0..w.width() {
                self.put_cell(gx, gy, [' ', ' '], Color::White, FLOOR_BG);
            }
        }

        // Store order, later actors on top; the player last of all.
        for actor in w.actors().filter(|a| Some(a.id) != w.player) {
            let (chars, fg, bg) = glyph(actor, false);
            self.put_cell(actor.x, actor.y, chars, fg, bg);
        }
        if let Some(p) = w.player_actor() {
            let (chars, fg, bg) = glyph(p, true);
            self.put_cell(p.x, p.y, chars, fg, bg);
        }
    }

    fn put_cell(&mut self, gx: usize, gy: usize, chars: [char; 2], fg: Color, bg: Color) {
        let col = gx * CELL_W;
        let row = MAP_ROW + gy;
        self.front.set(col, row, Cell::new(chars[0], fg, bg));
        self.front.set(col + 1, row, Cell::new(chars[1], fg, bg));
    }

    fn compose_rules(&mut self, w: &GameState) {
        let col = w.width() * CELL_W + PANEL_GAP;
        self.front.put_str(col, MAP_ROW, "Rules", Color::DarkGrey, Color::Reset);
        if w.rules.is_empty() {
            self.front.put_str(col, MAP_ROW + 1, "(none)", Color::DarkGrey, Color::Reset);
            return;
        }
        for (i, rule) in w.rules.iter().enumerate() {
            let row = MAP_ROW + 1 + i;
            let subject = rule.subject.to_string();
            self.front.put_str(col, row, &subject, SUBJECT_FG, Color::Reset);
            let attr_col = col + subject.len() + 1;
            self.front.put_str(attr_col, row, &rule.attribute.to_string(), rule_color(rule.attribute), Color::Reset);
        }
    }

    fn compose_footer(&mut self, w: &GameState, hud: &Hud) {
        let rows_used = w.height().max(w.rules.len() + 1);
        let status_row = MAP_ROW + rows_used + 1;
        let (text, fg) = status_line(w, hud.index + 1 >= hud.total);
        self.front.put_str(1, status_row, &text, fg, Color::Reset);
        if !hud.message.is_empty() {
            let col = text.chars().count() + 3;
            self.front.put_str(col, status_row, &hud.message, Color::DarkGrey, Color::Reset);
        }

        let help = " Arrows/WASD:move  Z/U:undo  R:restart  Q/Esc:quit";
        self.front.put_str(0, status_row + 2, help, Color::DarkGrey, Color::Reset);
    }
}
