/// Gravity direction and the resolver — single source of truth for movement.
///
/// ## Resolution algorithm
///
/// One call = one complete settle of the player under the current gravity:
///   1. PORTAL PRE-CHECK — if the start cell is a portal endpoint, the
///      effective start becomes the linked cell. At most one teleport per
///      call; the exit cell is never re-checked, so linked portal chains
///      cannot loop.
///   2. SLIDING PASS — advance one cell at a time in the gravity direction.
///      Out-of-bounds or Wall ahead: stop on the current cell. Spike ahead:
///      stop on the current cell and flag a hazard (the player never enters
///      the spike cell).
///   3. GOAL CHECK — a non-hazard rest on the goal cell wins.
///
/// The resolver is a pure function: no state, no side effects, identical
/// inputs always produce the identical outcome.

use super::grid::{Coord, GridIndex, Occupant};

/// The axis and sign along which the player slides each turn.
/// Discriminants are the rotation order: rotate-right adds 1 mod 4,
/// rotate-left adds 3.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Gravity {
    Down = 0,
    Right = 1,
    Up = 2,
    Left = 3,
}

impl Gravity {
    /// Direction after rotating by `delta` quarter turns (+1 = clockwise).
    pub fn rotated(self, delta: i32) -> Gravity {
        match (self as i32 + delta).rem_euclid(4) {
            0 => Gravity::Down,
            1 => Gravity::Right,
            2 => Gravity::Up,
            _ => Gravity::Left,
        }
    }

    /// Unit step in this direction. Screen convention: +y is down.
    pub fn step(self) -> (i32, i32) {
        match self {
            Gravity::Down => (0, 1),
            Gravity::Right => (1, 0),
            Gravity::Up => (0, -1),
            Gravity::Left => (-1, 0),
        }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity::Down
    }
}

/// Terminal event of one resolution.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResolveEvent {
    None,
    ReachedGoal,
    HitHazard,
}

/// Outcome of one gravity application.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Resolution {
    pub position: Coord,
    pub event: ResolveEvent,
}

/// Settle the player from `start` under `direction`.
///
/// A zero-length slide is a valid outcome (`event == None`, position
/// unchanged apart from any portal teleport).
pub fn resolve(start: Coord, direction: Gravity, grid: &GridIndex, goal: Coord) -> Resolution {
    let mut pos = match grid.occupant_at(start) {
        Occupant::Portal(link) => link,
        _ => start,
    };

    let (dx, dy) = direction.step();
    loop {
        let next = Coord::new(pos.x + dx, pos.y + dy);
        if !grid.in_bounds(next) {
            break;
        }
        match grid.occupant_at(next) {
            Occupant::Wall => break,
            Occupant::Spike => {
                return Resolution {
                    position: pos,
                    event: ResolveEvent::HitHazard,
                };
            }
            // Empty and portal cells are both slid through; portals only
            // act on the cell a resolution starts from.
            Occupant::Empty | Occupant::Portal(_) => pos = next,
        }
    }

    let event = if pos == goal {
        ResolveEvent::ReachedGoal
    } else {
        ResolveEvent::None
    };
    Resolution { position: pos, event }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::LevelDef;

    /// Build a grid from character rows.
    /// '#' wall, '^' spike, digits = portal pairs, anything else empty.
    /// Start/goal land on the first empty cell so maps may put features
    /// anywhere, including the origin.
    fn grid_from(rows: &[&str]) -> GridIndex {
        let size = rows.len() as i32;
        let mut walls = vec![];
        let mut spikes = vec![];
        let mut endpoints: Vec<(char, Coord)> = vec![];
        let mut open = None;
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let c = Coord::new(x as i32, y as i32);
                match ch {
                    '#' => walls.push(c),
                    '^' => spikes.push(c),
                    d if d.is_ascii_digit() => endpoints.push((d, c)),
                    _ => {
                        if open.is_none() {
                            open = Some(c);
                        }
                    }
                }
            }
        }
        let mut portals = vec![];
        endpoints.sort_by_key(|&(d, _)| d);
        for pair in endpoints.chunks(2) {
            portals.push((pair[0].1, pair[1].1));
        }
        let open = open.expect("map needs at least one empty cell");
        let def = LevelDef {
            name: "test".to_string(),
            size,
            player_start: open,
            goal: open,
            walls,
            spikes,
            portals,
        };
        GridIndex::build(&def).unwrap()
    }

    fn empty_10() -> GridIndex {
        grid_from(&[".........."; 10])
    }

    const NO_GOAL: Coord = Coord::new(-1, -1);

    #[test]
    fn maps_may_place_features_at_the_origin() {
        // The fixture's start/goal must dodge occupied cells, or maps
        // with a feature at (0,0) fail validation before any assertion.
        let grid = grid_from(&[
            "#.",
            ".^",
        ]);
        assert_eq!(grid.occupant_at(Coord::new(0, 0)), Occupant::Wall);
        assert_eq!(grid.occupant_at(Coord::new(1, 1)), Occupant::Spike);
    }

    // ── sliding pass ──

    #[test]
    fn slides_to_each_boundary_on_empty_board() {
        let grid = empty_10();
        let start = Coord::new(3, 3);
        let cases = [
            (Gravity::Down, Coord::new(3, 9)),
            (Gravity::Right, Coord::new(9, 3)),
            (Gravity::Up, Coord::new(3, 0)),
            (Gravity::Left, Coord::new(0, 3)),
        ];
        for (dir, expect) in cases {
            let r = resolve(start, dir, &grid, NO_GOAL);
            assert_eq!(r.position, expect, "direction {dir:?}");
            assert_eq!(r.event, ResolveEvent::None);
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let grid = grid_from(&[
            "..........",
            "..........",
            "..........",
            "...#......",
            "..........",
            "......^...",
            "..........",
            "..0.......",
            ".......0..",
            "..........",
        ]);
        let a = resolve(Coord::new(2, 7), Gravity::Down, &grid, Coord::new(7, 9));
        let b = resolve(Coord::new(2, 7), Gravity::Down, &grid, Coord::new(7, 9));
        assert_eq!(a, b);
    }

    #[test]
    fn wall_directly_ahead_blocks_in_place() {
        let grid = grid_from(&[
            "....",
            "..#.",
            "..#.",
            "....",
        ]);
        let r = resolve(Coord::new(2, 0), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(2, 0));
        assert_eq!(r.event, ResolveEvent::None);
    }

    #[test]
    fn wall_stops_slide_partway() {
        let grid = grid_from(&[
            "....",
            "....",
            "....",
            ".#..",
        ]);
        let r = resolve(Coord::new(1, 0), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(1, 2));
    }

    // ── hazards ──

    #[test]
    fn spike_ahead_stops_one_short_with_hazard() {
        let grid = grid_from(&[
            "....",
            ".^..",
            "....",
            "....",
        ]);
        let r = resolve(Coord::new(1, 0), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(1, 0));
        assert_eq!(r.event, ResolveEvent::HitHazard);
    }

    #[test]
    fn spike_hit_after_sliding_keeps_last_valid_cell() {
        let grid = grid_from(&[
            "......",
            "......",
            "......",
            "......",
            "...^..",
            "......",
        ]);
        let r = resolve(Coord::new(3, 0), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(3, 3));
        assert_eq!(r.event, ResolveEvent::HitHazard);
    }

    #[test]
    fn hazard_suppresses_goal() {
        // Goal on the rest cell, but the slide ends by hitting a spike.
        let grid = grid_from(&[
            "....",
            "....",
            ".^..",
            "....",
        ]);
        let r = resolve(Coord::new(1, 0), Gravity::Down, &grid, Coord::new(1, 1));
        assert_eq!(r.event, ResolveEvent::HitHazard);
    }

    // ── portals ──

    #[test]
    fn portal_teleports_then_slides_from_exit() {
        let grid = grid_from(&[
            "0.....",
            "......",
            "......",
            "....0.",
            "....#.",
            "......",
        ]);
        // Start on the (4,3) endpoint: exit at (0,0), then fall down column 0.
        let r = resolve(Coord::new(4, 3), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(0, 5));
        assert_eq!(r.event, ResolveEvent::None);
    }

    #[test]
    fn no_chained_teleport_from_exit_endpoint() {
        // (0,0)<->(2,0) and (2,5)<->(4,0). Starting on (0,0) with gravity
        // Down exits at (2,0) and falls column 2, entering the (2,5)
        // endpoint as a plain cell — it must not re-teleport to (4,0).
        let grid = grid_from(&[
            "0.0.1.",
            "......",
            "......",
            "......",
            "......",
            "..1...",
        ]);
        let r = resolve(Coord::new(0, 0), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(2, 5));
    }

    #[test]
    fn sliding_through_a_portal_does_not_teleport() {
        let grid = grid_from(&[
            "......",
            "......",
            "...0..",
            "......",
            "...#..",
            "....0.",
        ]);
        // Falls through the (3,2) endpoint and rests above the wall; no
        // teleport because the slide did not start on the endpoint.
        let r = resolve(Coord::new(3, 0), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(3, 3));
    }

    #[test]
    fn zero_length_slide_after_teleport() {
        let grid = grid_from(&[
            "......",
            "....0.",
            "....#.",
            "......",
            "..0...",
            "..#...",
        ]);
        // Teleport (2,4) -> (4,1); the exit already rests on a wall.
        let r = resolve(Coord::new(2, 4), Gravity::Down, &grid, NO_GOAL);
        assert_eq!(r.position, Coord::new(4, 1));
        assert_eq!(r.event, ResolveEvent::None);
    }

    // ── goal ──

    #[test]
    fn resting_exactly_on_goal_wins() {
        let grid = empty_10();
        let r = resolve(Coord::new(4, 2), Gravity::Down, &grid, Coord::new(4, 9));
        assert_eq!(r.event, ResolveEvent::ReachedGoal);
    }

    #[test]
    fn resting_one_cell_short_does_not_win() {
        let grid = empty_10();
        let r = resolve(Coord::new(4, 2), Gravity::Down, &grid, Coord::new(4, 8));
        assert_eq!(r.position, Coord::new(4, 9));
        assert_eq!(r.event, ResolveEvent::None);
    }

    #[test]
    fn zero_length_slide_on_goal_wins() {
        let grid = grid_from(&[
            "....",
            ".#..",
            "....",
            "....",
        ]);
        let r = resolve(Coord::new(1, 0), Gravity::Down, &grid, Coord::new(1, 0));
        assert_eq!(r.position, Coord::new(1, 0));
        assert_eq!(r.event, ResolveEvent::ReachedGoal);
    }

    // ── rotation arithmetic ──

    #[test]
    fn default_direction_is_down() {
        assert_eq!(Gravity::default(), Gravity::Down);
    }

    #[test]
    fn rotation_wraps_mod_four() {
        assert_eq!(Gravity::Down.rotated(1), Gravity::Right);
        assert_eq!(Gravity::Down.rotated(-1), Gravity::Left);
        assert_eq!(Gravity::Left.rotated(1), Gravity::Down);
        assert_eq!(Gravity::Up.rotated(2), Gravity::Down);
        assert_eq!(Gravity::Right.rotated(-1), Gravity::Down);
        assert_eq!(Gravity::Down.rotated(4), Gravity::Down);
    }
}
