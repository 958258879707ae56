/// LevelSession: the mutable puzzle state and its player-facing commands.
///
/// ## State machine
///
///   Active --rotate, event None-------> Active
///   Active --rotate, event HitHazard--> Hazard
///   Active --rotate, event ReachedGoal> Complete
///
/// Hazard blocks further rotates; the driver is expected to call `reset`
/// after its flash delay. Complete is terminal for the level: the driver
/// either advances or restarts. Every (re)load builds a fresh `GridIndex`
/// and discards the previous one — no state crosses level boundaries
/// except the running game totals.
///
/// Gravity is always "live": `load` ends with one settle before the player
/// issues any command.

use log::debug;

use crate::domain::gravity::{self, Gravity, ResolveEvent};
use crate::domain::grid::{Coord, GridIndex, LevelDef, LevelError, Occupant};

use super::event::GameEvent;
use super::level::LevelCatalog;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    /// Accepting rotate commands.
    Active,
    /// Hazard hit; rotates are ignored until the driver calls `reset`.
    Hazard,
    /// Goal reached; terminal for this level.
    Complete,
}

pub struct LevelSession {
    level_num: usize,
    total_levels: usize,
    level: LevelDef,
    grid: GridIndex,
    player: Coord,
    direction: Gravity,
    moves: u32,
    time: u32,
    total_moves: u32,
    total_time: u32,
    state: SessionState,
}

impl LevelSession {
    /// Start a session on level 1. Settle events from the initial load are
    /// discarded; the first render shows the settled position anyway.
    pub fn new(catalog: &LevelCatalog) -> Result<Self, LevelError> {
        let def = catalog.level(1)?;
        let grid = GridIndex::build(def)?;
        let mut session = LevelSession {
            level_num: 1,
            total_levels: catalog.total(),
            player: def.player_start,
            level: def.clone(),
            grid,
            direction: Gravity::default(),
            moves: 0,
            time: 0,
            total_moves: 0,
            total_time: 0,
            state: SessionState::Active,
        };
        let mut events = vec![];
        session.settle(&mut events);
        Ok(session)
    }

    /// Load a level by 1-based number: fresh index, reset counters and
    /// direction, then one settle. On error the session is left untouched,
    /// so the driver keeps playing the current level.
    pub fn load(
        &mut self,
        catalog: &LevelCatalog,
        num: usize,
    ) -> Result<Vec<GameEvent>, LevelError> {
        let def = catalog.level(num)?;
        let grid = GridIndex::build(def)?;

        self.level = def.clone();
        self.grid = grid;
        self.level_num = num;
        self.total_levels = catalog.total();
        self.player = self.level.player_start;
        self.direction = Gravity::default();
        self.moves = 0;
        self.time = 0;
        self.state = SessionState::Active;
        debug!("loaded level {num} ({})", self.level.name);

        let mut events = vec![];
        self.settle(&mut events);
        Ok(events)
    }

    /// Rotate gravity by `delta` quarter turns (+1 clockwise) and settle.
    /// Ignored outside the Active state. A rotation that moves nothing
    /// still counts as a move.
    pub fn rotate(&mut self, delta: i32) -> Vec<GameEvent> {
        if self.state != SessionState::Active {
            return vec![];
        }
        self.direction = self.direction.rotated(delta);
        self.moves += 1;
        let mut events = vec![GameEvent::Rotated {
            direction: self.direction,
        }];
        self.settle(&mut events);
        events
    }

    pub fn rotate_left(&mut self) -> Vec<GameEvent> {
        self.rotate(-1)
    }

    pub fn rotate_right(&mut self) -> Vec<GameEvent> {
        self.rotate(1)
    }

    /// Reload the current level, discarding this attempt's moves and time.
    pub fn reset(&mut self, catalog: &LevelCatalog) -> Result<Vec<GameEvent>, LevelError> {
        let num = self.level_num;
        self.load(catalog, num)
    }

    /// Move on to the next level. `None` when already at the last catalog
    /// level — the game is complete and nothing changes.
    pub fn advance_level(
        &mut self,
        catalog: &LevelCatalog,
    ) -> Result<Option<Vec<GameEvent>>, LevelError> {
        if self.level_num >= catalog.total() {
            return Ok(None);
        }
        self.load(catalog, self.level_num + 1).map(Some)
    }

    /// Back to level 1 with zeroed game totals.
    pub fn restart_game(&mut self, catalog: &LevelCatalog) -> Result<Vec<GameEvent>, LevelError> {
        self.total_moves = 0;
        self.total_time = 0;
        self.load(catalog, 1)
    }

    /// One-second heartbeat from the external timer. Counts only while the
    /// attempt is live; hazard-pending and finished attempts accrue nothing.
    pub fn tick(&mut self) {
        if self.state == SessionState::Active {
            self.time += 1;
        }
    }

    // ── Internal ──

    /// Apply one gravity resolution and fold the outcome into the session.
    fn settle(&mut self, events: &mut Vec<GameEvent>) {
        let from = self.player;
        // The resolver handles the teleport itself; this is just the
        // notification for the portal flash and sound.
        if let Occupant::Portal(link) = self.grid.occupant_at(from) {
            events.push(GameEvent::Teleported { from, to: link });
        }
        let outcome = gravity::resolve(self.player, self.direction, &self.grid, self.level.goal);
        self.player = outcome.position;
        if outcome.position != from {
            events.push(GameEvent::Moved {
                from,
                to: outcome.position,
            });
        }

        match outcome.event {
            ResolveEvent::None => {}
            ResolveEvent::HitHazard => {
                debug!("hazard at ({},{})", self.player.x, self.player.y);
                self.state = SessionState::Hazard;
                events.push(GameEvent::HazardHit { at: self.player });
            }
            ResolveEvent::ReachedGoal => {
                debug!(
                    "level {} complete: {} moves, {}s",
                    self.level_num, self.moves, self.time,
                );
                self.state = SessionState::Complete;
                self.total_moves += self.moves;
                self.total_time += self.time;
                events.push(GameEvent::LevelComplete {
                    moves: self.moves,
                    time: self.time,
                });
                if self.level_num >= self.total_levels {
                    events.push(GameEvent::GameComplete {
                        total_moves: self.total_moves,
                        total_time: self.total_time,
                    });
                }
            }
        }
    }

    // ── Accessors ──

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn player(&self) -> Coord {
        self.player
    }

    pub fn direction(&self) -> Gravity {
        self.direction
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn total_moves(&self) -> u32 {
        self.total_moves
    }

    pub fn total_time(&self) -> u32 {
        self.total_time
    }

    pub fn level_num(&self) -> usize {
        self.level_num
    }

    pub fn total_levels(&self) -> usize {
        self.total_levels
    }

    pub fn level(&self) -> &LevelDef {
        &self.level
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::level_from_rows;

    fn catalog_from(maps: &[&[&str]]) -> LevelCatalog {
        let levels = maps
            .iter()
            .enumerate()
            .map(|(i, rows)| level_from_rows(&format!("L{}", i + 1), rows).unwrap())
            .collect();
        LevelCatalog::new(levels)
    }

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn load_settles_player_immediately() {
        let catalog = catalog_from(&[&[
            "....",
            ".P..",
            "...G",
            "....",
        ]]);
        let session = LevelSession::new(&catalog).unwrap();
        assert_eq!(session.player(), c(1, 3));
        assert_eq!(session.direction(), Gravity::Down);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn rotate_updates_direction_and_move_count() {
        let catalog = catalog_from(&[&[
            "....",
            ".P..",
            "...G",
            "....",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        let events = session.rotate_right();
        assert_eq!(session.direction(), Gravity::Right);
        assert_eq!(session.moves(), 1);
        assert!(events.contains(&GameEvent::Rotated {
            direction: Gravity::Right,
        }));
        assert!(events.contains(&GameEvent::Moved {
            from: c(1, 3),
            to: c(3, 3),
        }));
    }

    #[test]
    fn blocked_rotation_still_counts_as_a_move() {
        // Player boxed in on three sides; nothing moves but the move counts.
        let catalog = catalog_from(&[&[
            ".#..",
            "#P#.",
            ".#.G",
            "....",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        assert_eq!(session.player(), c(1, 1));
        let events = session.rotate_right();
        assert_eq!(session.player(), c(1, 1));
        assert_eq!(session.moves(), 1);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::Moved { .. })));
    }

    #[test]
    fn hazard_blocks_rotates_until_reset() {
        let catalog = catalog_from(&[&[
            ".P..",
            "....",
            "....",
            "G.^.",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        assert_eq!(session.player(), c(1, 3));

        let events = session.rotate_right();
        assert_eq!(session.state(), SessionState::Hazard);
        assert_eq!(session.player(), c(1, 3));
        assert!(events.contains(&GameEvent::HazardHit { at: c(1, 3) }));

        // Further rotates are swallowed while the reset is pending.
        assert!(session.rotate_left().is_empty());
        assert_eq!(session.moves(), 1);

        session.reset(&catalog).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.player(), c(1, 3));
    }

    #[test]
    fn tick_counts_only_while_active() {
        let catalog = catalog_from(&[&[
            ".P..",
            "....",
            "....",
            "G.^.",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        session.tick();
        session.tick();
        assert_eq!(session.time(), 2);

        session.rotate_right(); // hazard
        session.tick();
        assert_eq!(session.time(), 2);
    }

    #[test]
    fn rotating_off_a_portal_endpoint_reports_the_teleport() {
        // Settle lands on the (1,3) endpoint; the next rotate exits at
        // (3,0) and slides nowhere (already on the right edge).
        let catalog = catalog_from(&[&[
            ".P.0",
            "....",
            "....",
            ".0.G",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        assert_eq!(session.player(), c(1, 3));

        let events = session.rotate_right();
        assert_eq!(session.player(), c(3, 0));
        assert!(events.contains(&GameEvent::Teleported {
            from: c(1, 3),
            to: c(3, 0),
        }));
        assert!(events.contains(&GameEvent::Moved {
            from: c(1, 3),
            to: c(3, 0),
        }));
    }

    #[test]
    fn goal_completes_level_and_folds_totals() {
        let catalog = catalog_from(&[&[
            ".P..",
            "....",
            "....",
            "..G#",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        assert_eq!(session.player(), c(1, 3));
        session.tick();
        session.tick();

        let events = session.rotate_right();
        assert_eq!(session.player(), c(2, 3));
        assert_eq!(session.state(), SessionState::Complete);
        assert!(events.contains(&GameEvent::LevelComplete { moves: 1, time: 2 }));
        // Single-level catalog: finishing it finishes the game.
        assert!(events.contains(&GameEvent::GameComplete {
            total_moves: 1,
            total_time: 2,
        }));
        assert_eq!(session.total_moves(), 1);
        assert_eq!(session.total_time(), 2);

        // Complete is terminal: rotates do nothing.
        assert!(session.rotate_right().is_empty());
        session.tick();
        assert_eq!(session.time(), 2);
    }

    #[test]
    fn advance_level_stops_at_catalog_end() {
        let lvl: &[&str] = &[
            ".P..",
            "....",
            "....",
            "..G#",
        ];
        let catalog = catalog_from(&[lvl, lvl]);
        let mut session = LevelSession::new(&catalog).unwrap();

        session.rotate_right(); // complete level 1
        assert!(session.advance_level(&catalog).unwrap().is_some());
        assert_eq!(session.level_num(), 2);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.total_moves(), 1);

        session.rotate_right(); // complete level 2
        assert_eq!(session.total_moves(), 2);
        assert!(session.advance_level(&catalog).unwrap().is_none());
        assert_eq!(session.level_num(), 2);
    }

    #[test]
    fn restart_game_zeroes_totals() {
        let lvl: &[&str] = &[
            ".P..",
            "....",
            "....",
            "..G#",
        ];
        let catalog = catalog_from(&[lvl, lvl]);
        let mut session = LevelSession::new(&catalog).unwrap();
        session.rotate_right();
        session.advance_level(&catalog).unwrap();
        session.rotate_right();
        assert_eq!(session.total_moves(), 2);

        session.restart_game(&catalog).unwrap();
        assert_eq!(session.level_num(), 1);
        assert_eq!(session.total_moves(), 0);
        assert_eq!(session.total_time(), 0);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn failed_load_leaves_session_untouched() {
        let catalog = catalog_from(&[&[
            ".P..",
            "....",
            "....",
            "..G#",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        session.rotate_left();
        let before = session.player();

        assert!(session.load(&catalog, 7).is_err());
        assert_eq!(session.level_num(), 1);
        assert_eq!(session.player(), before);
        assert_eq!(session.moves(), 1);
    }

    #[test]
    fn full_tour_of_an_open_board() {
        // Wall column x=5, rows 0..=4 — the walls never touch the slide
        // paths along the lower edges, but the Left pass along row 0 stops
        // against the column.
        let catalog = catalog_from(&[&[
            ".....#....",
            ".P...#....",
            ".....#....",
            ".....#....",
            ".....#....",
            "..........",
            "..........",
            "..........",
            "........G.",
            "..........",
        ]]);
        let mut session = LevelSession::new(&catalog).unwrap();
        assert_eq!(session.player(), c(1, 9)); // initial settle

        session.rotate_right();
        assert_eq!(session.player(), c(9, 9)); // Right: along the bottom
        session.rotate_right();
        assert_eq!(session.player(), c(9, 0)); // Up: right edge
        session.rotate_right();
        assert_eq!(session.player(), c(6, 0)); // Left: stops at the column
        session.rotate_right();
        assert_eq!(session.player(), c(6, 9)); // Down: clear column
        assert_eq!(session.moves(), 4);
        assert_eq!(session.state(), SessionState::Active);
    }
}
