/// Level catalog and text format.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1: `# Level Name` (optional)
///   Then one row of characters per board row; the board must be square.
///
/// ## Tile legend:
///   '#' = Wall            '^' = Spike
///   'P' = Player start    'G' = Goal
///   '0'-'9' = Portal pair (each digit exactly twice; the two cells link)
///   '.' or ' ' = Empty
///
/// How levels are produced is opaque to the rest of the game: the session
/// only ever sees validated `LevelDef`s through the catalog.

use std::path::Path;

use log::{info, warn};

use crate::config::GameConfig;
use crate::domain::grid::{Coord, GridIndex, LevelDef, LevelError};

/// The set of playable levels, validated once at load time.
pub struct LevelCatalog {
    levels: Vec<LevelDef>,
}

impl LevelCatalog {
    /// Load the catalog: `levels/` directory if it has level files,
    /// otherwise the built-in set. Malformed files are skipped with a
    /// warning rather than aborting the whole catalog.
    pub fn load(config: &GameConfig) -> Self {
        let mut levels = load_from_directory(&config.levels_dir);
        if levels.is_empty() {
            levels = embedded_levels();
            info!("level catalog: {} built-in levels", levels.len());
        } else {
            info!(
                "level catalog: {} levels from {}",
                levels.len(),
                config.levels_dir.display(),
            );
        }
        LevelCatalog { levels }
    }

    pub fn new(levels: Vec<LevelDef>) -> Self {
        LevelCatalog { levels }
    }

    /// Level by 1-based number.
    pub fn level(&self, num: usize) -> Result<&LevelDef, LevelError> {
        if num == 0 || num > self.levels.len() {
            return Err(LevelError::NotFound(num));
        }
        Ok(&self.levels[num - 1])
    }

    pub fn total(&self) -> usize {
        self.levels.len()
    }
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level_file(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if rows.is_empty() && name.is_empty() && line.starts_with("# ") {
            name = line[2..].trim().to_string();
        } else {
            rows.push(line);
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = "Unnamed Grid".to_string();
    }

    level_from_rows(&name, &rows)
}

/// Build a `LevelDef` from character rows. The board must be square;
/// exactly one 'P' and one 'G'; every portal digit appears exactly twice.
pub fn level_from_rows(name: &str, rows: &[&str]) -> Result<LevelDef, LevelError> {
    let size = rows.len();
    if size == 0 {
        return Err(LevelError::InvalidLevel("level has no rows".to_string()));
    }

    let mut player = None;
    let mut goal = None;
    let mut walls = vec![];
    let mut spikes = vec![];
    // Endpoint lists per digit, in row-major scan order.
    let mut endpoints: Vec<(char, Vec<Coord>)> = vec![];

    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() != size {
            return Err(LevelError::InvalidLevel(format!(
                "row {y} has {} cells; a {size}-row board needs {size} per row",
                row.chars().count(),
            )));
        }
        for (x, ch) in row.chars().enumerate() {
            let c = Coord::new(x as i32, y as i32);
            match ch {
                '#' => walls.push(c),
                '^' => spikes.push(c),
                'P' => {
                    if player.replace(c).is_some() {
                        return Err(LevelError::InvalidLevel(
                            "more than one player start".to_string(),
                        ));
                    }
                }
                'G' => {
                    if goal.replace(c).is_some() {
                        return Err(LevelError::InvalidLevel(
                            "more than one goal".to_string(),
                        ));
                    }
                }
                d if d.is_ascii_digit() => {
                    match endpoints.iter_mut().find(|(tag, _)| *tag == d) {
                        Some((_, cells)) => cells.push(c),
                        None => endpoints.push((d, vec![c])),
                    }
                }
                '.' | ' ' => {}
                other => {
                    return Err(LevelError::InvalidLevel(format!(
                        "unknown tile '{other}' at ({x},{y})",
                    )));
                }
            }
        }
    }

    let player_start = player
        .ok_or_else(|| LevelError::InvalidLevel("no player start ('P')".to_string()))?;
    let goal = goal
        .ok_or_else(|| LevelError::InvalidLevel("no goal ('G')".to_string()))?;

    let mut portals = vec![];
    for (tag, cells) in endpoints {
        if cells.len() != 2 {
            return Err(LevelError::InvalidLevel(format!(
                "portal '{tag}' has {} endpoints; a pair needs exactly 2",
                cells.len(),
            )));
        }
        portals.push((cells[0], cells[1]));
    }

    let def = LevelDef {
        name: name.to_string(),
        size: size as i32,
        player_start,
        goal,
        walls,
        spikes,
        portals,
    };

    // Catch overlap problems here, once, so the session never sees a
    // definition the index would refuse.
    GridIndex::build(&def)?;

    Ok(def)
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut found: Vec<(String, LevelDef)> = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map_or(false, |e| e == "txt") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("could not read {}: {e}", path.display());
                continue;
            }
        };
        match parse_level_file(&content) {
            Ok(def) => {
                let filename = path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                found.push((filename, def));
            }
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    let sources: &[(&str, &[&str])] = &[
        ("Grid 1 - First Fall", &[
            ".....#....",
            ".P...#....",
            ".....#....",
            ".....#....",
            ".....#....",
            "..........",
            "..........",
            "..........",
            "..........",
            ".........G",
        ]),
        ("Grid 2 - Split Column", &[
            ".....#....",
            ".P...#....",
            ".....#....",
            ".....#....",
            ".....#....",
            "..........",
            ".#...#....",
            ".....#....",
            ".....#....",
            ".....#G...",
        ]),
        ("Grid 3 - Offset Gates", &[
            "....#G....",
            ".P..#.....",
            "....#.....",
            "....#.....",
            "..........",
            "..........",
            "......#...",
            "......#...",
            "......#...",
            "......#...",
        ]),
        ("Grid 4 - Corner Route", &[
            ".........#",
            ".P........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "........G.",
            "....^...#.",
        ]),
        ("Grid 5 - Spike Alley", &[
            "....#..^..",
            ".P........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "........G#",
            "...#..^...",
        ]),
        ("Grid 6 - Wormhole", &[
            "..........",
            ".P........",
            "..........",
            "..........",
            "........0.",
            "..........",
            "..........",
            "..........",
            "........G.",
            "....0#..#.",
        ]),
        ("Grid 7 - Round Trip", &[
            "..........",
            "..P..0....",
            ".........^",
            "..........",
            "....^.....",
            "..........",
            "..........",
            "........0#",
            "..#..G....",
            "^....#....",
        ]),
        ("Grid 8 - Twin Gates", &[
            "..........",
            "...P......",
            ".....#..0.",
            ".#0......^",
            "..........",
            "^.......1.",
            "........#.",
            "...1....#.",
            ".......G..",
            "......##..",
        ]),
    ];

    sources
        .iter()
        .filter_map(|(name, rows)| match level_from_rows(name, rows) {
            Ok(def) => Some(def),
            Err(e) => {
                warn!("built-in level {name:?} is invalid: {e}");
                None
            }
        })
        .collect()
}
