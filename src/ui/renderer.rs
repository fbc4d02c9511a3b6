/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into `front` (one `Glyph` per terminal column)
///   2. Compare each glyph with `back` (the previous frame)
///   3. Emit terminal commands only for glyphs that changed, batched with `queue!`
///   4. Swap front/back
///
/// Each map cell is two terminal columns wide. Actors are drawn on the cell
/// nearest their pixel centre.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use pitrunner::domain::projectile::Fireball;
use pitrunner::{Cell, Facing, Phase, Tile, WorldState};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Never produced by composition; forces a full repaint.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, glyphs: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.glyphs.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    /// Paint one map cell (two columns).
    fn put_cell(&mut self, col: usize, row: usize, pair: [char; 2], fg: Color, bg: Color) {
        self.set(col, row, Glyph::new(pair[0], fg, bg));
        self.set(col + 1, row, Glyph::new(pair[1], fg, bg));
    }
}

// ── Renderer ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const GROUND_FG: Color = Color::Rgb { r: 180, g: 120, b: 60 };
const GROUND_BG: Color = Color::Rgb { r: 100, g: 65, b: 30 };
const HOLE_BG: Color = Color::Rgb { r: 10, g: 8, b: 0 };
const LADDER_FG: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const COIN_FG: Color = Color::Rgb { r: 255, g: 210, b: 40 };
const PLAYER_FG: Color = Color::Rgb { r: 120, g: 255, b: 120 };
const ENEMY_FG: Color = Color::Rgb { r: 255, g: 90, b: 90 };
const FIRE_FG: Color = Color::Rgb { r: 255, g: 150, b: 30 };
const HUD_FG: Color = Color::Rgb { r: 200, g: 200, b: 200 };

/// Front-end facts the world does not carry.
pub struct HudInfo<'a> {
    pub level_name: &'a str,
    pub level_count: usize,
    pub best_ms: Option<u64>,
    pub status: Option<&'a str>,
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
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.fit_terminal();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, w: &WorldState, hud: &HudInfo) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.fit_terminal();
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, w, hud);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn fit_terminal(&mut self) {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.glyphs.fill(Glyph::INVALID);
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ══════════════════════════════════════════════════════════════
// Composition
// ══════════════════════════════════════════════════════════════

fn compose(buf: &mut FrameBuffer, w: &WorldState, hud: &HudInfo) {
    compose_hud(buf, w, hud);

    for (r, row) in w.grid.rows().iter().enumerate() {
        for (c, &tile) in row.iter().enumerate() {
            compose_tile(buf, w, Cell::new(r as i32, c as i32), tile);
        }
    }

    for e in &w.explosions {
        put_actor(buf, w, cell_at(w, e.x, e.y), ['░', '░'], FIRE_FG);
    }
    for f in &w.fireballs {
        let half = Fireball::size(w.physics.tile_size) / 2.0;
        put_actor(buf, w, cell_at(w, f.x + half, f.y + half), ['●', ' '], FIRE_FG);
    }
    for e in &w.enemies {
        put_actor(buf, w, w.enemy_cell(e), ['▼', '▼'], ENEMY_FG);
    }
    let pair = match w.player.facing {
        Facing::Left => ['◀', '█'],
        Facing::Right => ['█', '▶'],
    };
    put_actor(buf, w, w.player_cell(), pair, PLAYER_FG);

    compose_banner(buf, w, hud);
}

fn compose_hud(buf: &mut FrameBuffer, w: &WorldState, hud: &HudInfo) {
    let best = hud.best_ms.map(fmt_ms).unwrap_or_else(|| "--".to_string());
    let line = format!(
        " {} ({}/{})  ${}/{}  time {}  best {}  fire x{} ",
        hud.level_name,
        w.level_index + 1,
        hud.level_count,
        w.player.coins,
        w.grid.total_coins(),
        fmt_ms(w.elapsed_ms()),
        best,
        w.ammo,
    );
    buf.put_str(0, HUD_ROW, &line, HUD_FG, Glyph::BASE_BG);
    if let Some(status) = hud.status {
        buf.put_str(0, HUD_ROW + 1, status, Color::DarkGrey, Glyph::BASE_BG);
    }
}

fn compose_tile(buf: &mut FrameBuffer, w: &WorldState, cell: Cell, tile: Tile) {
    let (col, row) = screen_pos(cell);
    let is_hole = w.grid.holes().iter().any(|h| h.cell == cell);
    match tile {
        Tile::Empty if is_hole => buf.put_cell(col, row, [' ', ' '], Color::Reset, HOLE_BG),
        Tile::Empty => buf.put_cell(col, row, [' ', ' '], Color::Reset, Glyph::BASE_BG),
        Tile::Ground => buf.put_cell(col, row, ['░', '░'], GROUND_FG, GROUND_BG),
        Tile::Ladder => buf.put_cell(col, row, ['╠', '╣'], LADDER_FG, Glyph::BASE_BG),
        Tile::Coin => buf.put_cell(col, row, ['$', ' '], COIN_FG, Glyph::BASE_BG),
    }
}

fn put_actor(buf: &mut FrameBuffer, w: &WorldState, cell: Cell, pair: [char; 2], fg: Color) {
    if !w.grid.in_bounds(cell) {
        return;
    }
    let (col, row) = screen_pos(cell);
    buf.put_cell(col, row, pair, fg, Glyph::BASE_BG);
}

/// Centred message over the map for pause, win and caught.
fn compose_banner(buf: &mut FrameBuffer, w: &WorldState, hud: &HudInfo) {
    let lines: Vec<String> = match w.phase {
        Phase::Won { elapsed_ms } => {
            let mut v = vec![format!("LEVEL CLEAR  {}", fmt_ms(elapsed_ms))];
            if hud.best_ms == Some(elapsed_ms) {
                v.push("new best!".to_string());
            }
            v.push("N next level   R replay".to_string());
            v
        }
        Phase::Caught => vec!["CAUGHT!".to_string(), "R restart   F9 quickload".to_string()],
        Phase::Playing if w.paused => vec!["PAUSED".to_string(), "Esc resume".to_string()],
        Phase::Playing => return,
    };

    let map_w = w.grid.width() * CELL_W;
    let box_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    let box_x = map_w.saturating_sub(box_w) / 2;
    let box_y = MAP_ROW + w.grid.height().saturating_sub(lines.len() + 2) / 2;
    let dim = Color::Rgb { r: 40, g: 40, b: 40 };
    let hdr = Color::Rgb { r: 255, g: 220, b: 50 };

    for y in box_y..box_y + lines.len() + 2 {
        for x in box_x..box_x + box_w {
            buf.set(x, y, Glyph::new(' ', Color::Reset, dim));
        }
    }
    for (i, line) in lines.iter().enumerate() {
        let x = box_x + (box_w - line.chars().count()) / 2;
        let fg = if i == 0 { hdr } else { HUD_FG };
        buf.put_str(x, box_y + 1 + i, line, fg, dim);
    }
}

// ── Helpers ──

fn screen_pos(cell: Cell) -> (usize, usize) {
    (cell.col.max(0) as usize * CELL_W, MAP_ROW + cell.row.max(0) as usize)
}

fn cell_at(w: &WorldState, x: f32, y: f32) -> Cell {
    let t = w.physics.tile_size;
    Cell::new((y / t).floor() as i32, (x / t).floor() as i32)
}

/// `m:ss.t`
pub fn fmt_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}.{}", secs / 60, secs % 60, (ms % 1000) / 100)
}
