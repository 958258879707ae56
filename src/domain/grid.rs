/// Grid data model: coordinates, static occupants, and the O(1) lookup index.
///
/// A level is a square board of `size` × `size` cells. Static features
/// (walls, spikes, portal endpoints) never move after load; the player is
/// the only dynamic entity and lives in the session, not here.

use thiserror::Error;

/// A cell coordinate. Plain value type; valid range is `0..size` on both axes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }
}

/// Errors surfaced while loading or looking up levels.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid level data: {0}")]
    InvalidLevel(String),
    #[error("level {0} not found")]
    NotFound(usize),
}

/// Immutable description of one puzzle. Owned by the level catalog;
/// the session clones the active one on load.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub size: i32,
    pub player_start: Coord,
    pub goal: Coord,
    pub walls: Vec<Coord>,
    pub spikes: Vec<Coord>,
    /// Linked endpoint pairs; entering one endpoint exits at the other.
    pub portals: Vec<(Coord, Coord)>,
}

/// What statically occupies a cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Occupant {
    Empty,
    Wall,
    Spike,
    /// Portal endpoint; the payload is the linked exit cell.
    Portal(Coord),
}

/// Read-only occupant lookup, derived from a `LevelDef` on each level
/// (re)load and discarded on level change.
#[derive(Clone, Debug)]
pub struct GridIndex {
    size: i32,
    cells: Vec<Occupant>,
}

impl GridIndex {
    /// Derive the index from a level definition.
    ///
    /// Fails when a coordinate is out of bounds, a cell carries more than
    /// one static feature, or the player start / goal sits on a feature.
    /// Validity is checked here, once — the resolver never re-validates.
    pub fn build(def: &LevelDef) -> Result<Self, LevelError> {
        if def.size <= 0 {
            return Err(LevelError::InvalidLevel(format!(
                "board size {} must be positive", def.size,
            )));
        }

        let size = def.size;
        let mut cells = vec![Occupant::Empty; (size * size) as usize];

        let mut place = |c: Coord, occ: Occupant| -> Result<(), LevelError> {
            if c.x < 0 || c.y < 0 || c.x >= size || c.y >= size {
                return Err(LevelError::InvalidLevel(format!(
                    "({},{}) is outside the {size}x{size} board", c.x, c.y,
                )));
            }
            let idx = (c.y * size + c.x) as usize;
            if cells[idx] != Occupant::Empty {
                return Err(LevelError::InvalidLevel(format!(
                    "({},{}) holds more than one feature", c.x, c.y,
                )));
            }
            cells[idx] = occ;
            Ok(())
        };

        for &w in &def.walls {
            place(w, Occupant::Wall)?;
        }
        for &s in &def.spikes {
            place(s, Occupant::Spike)?;
        }
        for &(a, b) in &def.portals {
            place(a, Occupant::Portal(b))?;
            place(b, Occupant::Portal(a))?;
        }

        let grid = GridIndex { size, cells };

        for (what, c) in [("player start", def.player_start), ("goal", def.goal)] {
            if !grid.in_bounds(c) {
                return Err(LevelError::InvalidLevel(format!(
                    "{what} ({},{}) is outside the board", c.x, c.y,
                )));
            }
            if grid.occupant_at(c) != Occupant::Empty {
                return Err(LevelError::InvalidLevel(format!(
                    "{what} ({},{}) sits on a static feature", c.x, c.y,
                )));
            }
        }

        Ok(grid)
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    #[inline]
    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.size && c.y < self.size
    }

    /// Occupant at `c`. O(1). Any cell not explicitly listed in the level
    /// (including out-of-bounds queries) reads as `Empty`; bounds are the
    /// resolver's concern, not the index's.
    #[inline]
    pub fn occupant_at(&self, c: Coord) -> Occupant {
        if self.in_bounds(c) {
            self.cells[(c.y * self.size + c.x) as usize]
        } else {
            Occupant::Empty
        }
    }
}
