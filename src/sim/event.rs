/// Events emitted by session commands.
/// The presentation layer consumes these for rendering and sound.

use crate::domain::gravity::Gravity;
use crate::domain::grid::Coord;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Rotated { direction: Gravity },
    Teleported { from: Coord, to: Coord },
    Moved { from: Coord, to: Coord },
    HazardHit { at: Coord },
    LevelComplete { moves: u32, time: u32 },
    GameComplete { total_moves: u32, total_time: u32 },
}
