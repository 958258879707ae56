/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::LevelCatalog;
use sim::session::LevelSession;
use ui::input::InputState;
use ui::renderer::{Phase, Renderer};
use ui::sound::SoundEngine;

fn main() {
    env_logger::init();

    let config = GameConfig::load();
    let catalog = LevelCatalog::load(&config);
    if catalog.total() == 0 {
        eprintln!("No playable levels found.");
        return;
    }

    let mut session = match LevelSession::new(&catalog) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not start: {e}");
            return;
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &catalog, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing TiltGrid!");
}

// ── Key Constants ──

const KEYS_TILT_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_TILT_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn game_loop(
    session: &mut LevelSession,
    catalog: &LevelCatalog,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut phase = Phase::Title;
    let mut anim_tick: u32 = 0;

    let frame_sleep = Duration::from_millis(config.timing.frame_sleep_ms);
    let hazard_hold = Duration::from_millis(config.timing.hazard_reset_ms);

    // One-second heartbeat for the level timer.
    let mut last_second = Instant::now();
    // Set when a spike is hit; the level resets once the flash has run.
    let mut hazard_since: Option<Instant> = None;

    loop {
        kb.drain_events();
        if kb.ctrl_c_pressed() {
            break;
        }

        let confirm = kb.any_pressed(KEYS_CONFIRM);
        let esc = kb.any_pressed(&[KeyCode::Esc]);

        match phase {
            // ── Title Screen ──
            Phase::Title => {
                if confirm {
                    let events = session.restart_game(catalog)?;
                    phase = Phase::Playing;
                    last_second = Instant::now();
                    hazard_since = None;
                    apply_events(&events, sound, &mut phase, &mut hazard_since);
                } else if esc || kb.any_pressed(KEYS_QUIT) {
                    break;
                }
            }

            // ── Playing ──
            Phase::Playing => {
                if esc {
                    phase = Phase::Title;
                    hazard_since = None;
                } else if kb.any_pressed(KEYS_RESTART) {
                    let events = session.reset(catalog)?;
                    last_second = Instant::now();
                    hazard_since = None;
                    apply_events(&events, sound, &mut phase, &mut hazard_since);
                } else if kb.any_pressed(KEYS_TILT_LEFT) {
                    let events = session.rotate_left();
                    apply_events(&events, sound, &mut phase, &mut hazard_since);
                } else if kb.any_pressed(KEYS_TILT_RIGHT) {
                    let events = session.rotate_right();
                    apply_events(&events, sound, &mut phase, &mut hazard_since);
                }

                // Level timer: one tick per wall-clock second
                if last_second.elapsed() >= Duration::from_secs(1) {
                    session.tick();
                    last_second += Duration::from_secs(1);
                }

                // Spike flash finished → put the level back
                if hazard_since.map_or(false, |t| t.elapsed() >= hazard_hold) {
                    let events = session.reset(catalog)?;
                    last_second = Instant::now();
                    hazard_since = None;
                    apply_events(&events, sound, &mut phase, &mut hazard_since);
                }
            }

            // ── Level Complete ──
            Phase::LevelComplete => {
                if confirm {
                    if let Some(events) = session.advance_level(catalog)? {
                        phase = Phase::Playing;
                        last_second = Instant::now();
                        apply_events(&events, sound, &mut phase, &mut hazard_since);
                    }
                } else if esc {
                    phase = Phase::Title;
                }
            }

            // ── Game Complete ──
            Phase::GameComplete => {
                if confirm || esc {
                    phase = Phase::Title;
                }
            }
        }

        anim_tick = anim_tick.wrapping_add(1);
        renderer.render(phase, session, anim_tick)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

/// Fold session events into sound and phase transitions.
/// GameComplete always follows LevelComplete in the same batch, so the
/// later match arm wins the phase.
fn apply_events(
    events: &[GameEvent],
    sound: Option<&SoundEngine>,
    phase: &mut Phase,
    hazard_since: &mut Option<Instant>,
) {
    for event in events {
        match event {
            GameEvent::Rotated { .. } => {
                if let Some(sfx) = sound { sfx.play_rotate(); }
            }
            GameEvent::Teleported { .. } => {
                if let Some(sfx) = sound { sfx.play_teleport(); }
            }
            GameEvent::Moved { .. } => {
                if let Some(sfx) = sound { sfx.play_land(); }
            }
            GameEvent::HazardHit { .. } => {
                if let Some(sfx) = sound { sfx.play_hazard(); }
                *hazard_since = Some(Instant::now());
            }
            GameEvent::LevelComplete { .. } => {
                if let Some(sfx) = sound { sfx.play_clear(); }
                *phase = Phase::LevelComplete;
            }
            GameEvent::GameComplete { .. } => {
                if let Some(sfx) = sound { sfx.play_win(); }
                *phase = Phase::GameComplete;
            }
        }
    }
}
