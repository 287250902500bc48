//! Component C: pedal state (spec §4.3). A mapping from [`Button`] to
//! boolean pressed/released, updated by the matcher before rule
//! scanning and consulted for release-pop/soft-cap decisions. Not
//! observable externally.
//!
//! Grounded on the flat-array state table in `BounceFilter`
//! (`last_event_us`): a bounded id space is tracked with a growable
//! array indexed by id rather than a `HashMap`, since button numbers
//! are small, dense, and assigned once at config load.

use crate::model::{Action, Button};

pub struct PedalState {
    pressed: Vec<bool>,
}

impl PedalState {
    pub fn new() -> Self {
        PedalState { pressed: Vec::new() }
    }

    /// Pre-size for a known number of buttons (from the flattened
    /// device bindings), avoiding growth during the hot path.
    pub fn with_button_count(count: usize) -> Self {
        PedalState {
            pressed: vec![false; count],
        }
    }

    fn ensure_capacity(&mut self, button: Button) {
        let idx = button as usize;
        if idx >= self.pressed.len() {
            self.pressed.resize(idx + 1, false);
        }
    }

    /// A `Down` sets the flag, an `Up` clears it.
    pub fn apply(&mut self, button: Button, action: Action) {
        self.ensure_capacity(button);
        self.pressed[button as usize] = action == Action::Down;
    }

    /// Is this button currently held?
    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed.get(button as usize).copied().unwrap_or(false)
    }
}

impl Default for PedalState {
    fn default() -> Self {
        PedalState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_press_and_release() {
        let mut s = PedalState::new();
        assert!(!s.is_pressed(1));
        s.apply(1, Action::Down);
        assert!(s.is_pressed(1));
        s.apply(1, Action::Up);
        assert!(!s.is_pressed(1));
    }

    #[test]
    fn unknown_button_reads_as_released() {
        let s = PedalState::new();
        assert!(!s.is_pressed(99));
    }
}
