/// Input state tracker.
///
/// Every command in the game is edge-triggered: a rotate fires once per
/// key press (terminal auto-repeat counts as another press, so holding an
/// arrow keeps tilting). Nothing cares about keys being held down, so the
/// tracker only records the presses seen since the last drain.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, poll};

pub struct InputState {
    /// Key codes from Press/Repeat events in the most recent drain.
    presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events and record key presses.
    /// Call this once per frame, before acting on input.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw_events.push(key);
                    // Release events carry no command; everything else does
                    if key.kind != KeyEventKind::Release {
                        self.presses.push(key.code);
                    }
                }
                _ => {}
            }
        }
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.contains(&code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
