/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::gravity::Gravity;
use crate::domain::grid::{Coord, Occupant};
use crate::sim::session::{LevelSession, SessionState};

/// Which screen the game loop is showing. Owned by main; the renderer
/// only needs it to pick a compose function and detect transitions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    LevelComplete,
    GameComplete,
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// On VTE-based Linux terminals the inter-row gap pixels use the
    /// background color from the last Clear. Using the SAME explicit RGB
    /// for `Clear(ClearType::All)` and every cell keeps the gap color
    /// identical to the cell color, so no horizontal lines show through.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 30 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }

    /// Write a string centered on row y.
    fn put_str_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Renderer ──

/// Each board cell = 2 terminal columns, so cells look roughly square.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
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
        // Force full repaint on first frame: back ≠ front for every cell.
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

    pub fn render(
        &mut self,
        phase: Phase,
        session: &LevelSession,
        anim_tick: u32,
    ) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        // Build front buffer
        self.front.clear();

        match phase {
            Phase::Title => self.compose_title(anim_tick),
            Phase::Playing => self.compose_game(session, anim_tick),
            Phase::LevelComplete => self.compose_level_complete(session, anim_tick),
            Phase::GameComplete => self.compose_game_complete(session, anim_tick),
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // Do NOT use ResetColor here — it resets to the terminal's native
        // default, which may differ from BASE_BG and cause line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
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

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &LevelSession, anim_tick: u32) {
        self.compose_hud(s);
        self.compose_board(s, anim_tick);

        let size = s.grid().size() as usize;
        let help_row = BOARD_ROW + size + 1;
        if help_row < self.front.height {
            let help = " ←/A:Tilt Left  →/D:Tilt Right  R:Restart  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_hud(&mut self, s: &LevelSession) {
        let buf_w = self.front.width;
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        let hud = format!(
            " Grid {}/{}  {}  Moves:{:<4} Time:{:<4} Gravity:{} ",
            s.level_num(), s.total_levels(), s.level().name,
            s.moves(), s.time(), gravity_arrow(s.direction()),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_board(&mut self, s: &LevelSession, anim_tick: u32) {
        let grid = s.grid();
        let size = grid.size();
        let left = self.front.width.saturating_sub(size as usize * CELL_W) / 2;

        for gy in 0..size {
            let row = BOARD_ROW + gy as usize;
            if row >= self.front.height { break; }
            for gx in 0..size {
                let col = left + gx as usize * CELL_W;
                self.compose_cell(s, Coord::new(gx, gy), col, row, anim_tick);
            }
        }
    }

    /// Write the visual for board cell `c` into the front buffer at (col, row).
    /// Each board cell = 2 terminal columns.
    fn compose_cell(&mut self, s: &LevelSession, c: Coord, col: usize, row: usize, anim_tick: u32) {
        // Player on top of everything
        if s.player() == c {
            let flash = s.state() == SessionState::Hazard && (anim_tick / 3) % 2 == 0;
            let (fg, bg) = if flash {
                (Color::White, Color::Rgb { r: 200, g: 40, b: 40 })
            } else {
                (Color::Rgb { r: 255, g: 220, b: 50 }, Color::Reset)
            };
            self.front.set(col, row, Cell::new('◆', fg, bg));
            self.front.set(col + 1, row, Cell::new(' ', fg, bg));
            return;
        }

        // Goal is not a static occupant; draw it before the feature lookup
        if s.level().goal == c {
            self.front.set(col, row, Cell::new('◎', Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset));
            self.front.set(col + 1, row, Cell::new(' ', Color::Reset, Color::Reset));
            return;
        }

        let (c0, c1, fg, bg) = match s.grid().occupant_at(c) {
            Occupant::Empty => ('·', ' ', Color::Rgb { r: 50, g: 50, b: 70 }, Color::Reset),
            Occupant::Wall => ('█', '█', Color::Rgb { r: 130, g: 130, b: 150 }, Color::Rgb { r: 70, g: 70, b: 85 }),
            Occupant::Spike => ('▲', ' ', Color::Rgb { r: 255, g: 80, b: 80 }, Color::Reset),
            Occupant::Portal(_) => ('◉', ' ', Color::Rgb { r: 200, g: 100, b: 255 }, Color::Reset),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    // ── Static screens (title, completion) ──

    fn compose_title(&mut self, anim_tick: u32) {
        let mid = self.front.height / 2;
        let top = mid.saturating_sub(6);

        self.front.put_str_centered(top, "T I L T G R I D", Color::Rgb { r: 255, g: 220, b: 50 }, Color::Reset);
        self.front.put_str_centered(top + 2, "rotate gravity · slide to the goal", Color::DarkGrey, Color::Reset);

        self.front.put_str_centered(top + 5, "←/A  tilt left     →/D  tilt right", Color::White, Color::Reset);
        self.front.put_str_centered(top + 6, "avoid ▲ spikes · ride ◉ portals · reach ◎", Color::White, Color::Reset);

        let blink = (anim_tick / 20) % 2 == 0;
        if blink {
            self.front.put_str_centered(top + 9, "▸▸▸ PRESS ENTER TO START ◂◂◂", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        }
        self.front.put_str_centered(top + 11, "Q / ESC to quit", Color::DarkGrey, Color::Reset);
    }

    fn compose_level_complete(&mut self, s: &LevelSession, anim_tick: u32) {
        self.compose_hud(s);
        self.compose_board(s, anim_tick);

        let size = s.grid().size() as usize;
        let msg_row = BOARD_ROW + size / 2;

        self.front.put_str_centered(msg_row, " ◈ GRID CLEAR! ◈ ", Color::Black, Color::Rgb { r: 200, g: 180, b: 50 });
        let stats = format!(" Moves: {}   Time: {}s ", s.moves(), s.time());
        self.front.put_str_centered(msg_row + 1, &stats, Color::Black, Color::Rgb { r: 200, g: 180, b: 50 });

        let blink = (anim_tick / 10) % 2 == 0;
        if blink {
            let prompt_row = BOARD_ROW + size + 1;
            self.front.put_str_centered(prompt_row, "ENTER: Next Grid   ESC: Title", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        }
    }

    fn compose_game_complete(&mut self, s: &LevelSession, anim_tick: u32) {
        let mid = self.front.height / 2;
        let top = mid.saturating_sub(4);

        self.front.put_str_centered(top, "★ ALL GRIDS CLEAR! ★", Color::Rgb { r: 255, g: 220, b: 50 }, Color::Reset);
        let stats = format!(
            "{} grids · {} moves · {}s total",
            s.total_levels(), s.total_moves(), s.total_time(),
        );
        self.front.put_str_centered(top + 2, &stats, Color::White, Color::Reset);

        let blink = (anim_tick / 20) % 2 == 0;
        if blink {
            self.front.put_str_centered(top + 5, "ENTER: Back to Title", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        }
    }
}

fn gravity_arrow(g: Gravity) -> char {
    match g {
        Gravity::Down => '↓',
        Gravity::Right => '→',
        Gravity::Up => '↑',
        Gravity::Left => '←',
    }
}
