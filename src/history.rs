//! Component B: the event history (spec §4.2). An ordered,
//! append-only (with scoped pop on release) sequence of button
//! events with per-entry usage counters.
//!
//! Grounded on `BounceFilter` (the template's core, single-purpose
//! stateful container with a narrow public surface): this struct owns
//! its storage exclusively, is mutated only through the operations
//! below, and exposes a read-only view for the matcher's scan phase.

use crate::model::{Button, HistoryEntry};

/// Default soft cap on history length (spec §9 Open Question 3).
pub const DEFAULT_SOFT_CAP: usize = 256;

pub struct History {
    entries: Vec<HistoryEntry>,
    soft_cap: usize,
}

impl History {
    pub fn new() -> Self {
        History::with_capacity(DEFAULT_SOFT_CAP)
    }

    pub fn with_capacity(soft_cap: usize) -> Self {
        History {
            entries: Vec::with_capacity(soft_cap),
            soft_cap,
        }
    }

    /// Add a new entry at the tail with `used = 0`.
    pub fn append(&mut self, event: crate::model::ButtonEvent) {
        self.entries.push(HistoryEntry::new(event));
    }

    /// Read-only view of the current ordered entries, oldest first.
    pub fn snapshot(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Mutable access for the matcher's commit phase (incrementing
    /// `used` on matched entries). Indexes are positions into the
    /// slice returned by [`Self::snapshot`].
    pub fn entry_mut(&mut self, index: usize) -> &mut HistoryEntry {
        &mut self.entries[index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Called once the matcher has fully processed an `Up` event for
    /// `button` (§4.2). Removes the just-appended `Up` and, if no
    /// other button's events lie between it and its paired `Down`,
    /// removes that `Down` too. If intervening events exist, the
    /// `Down` stays live for future matches.
    pub fn release_pop(&mut self, button: Button) {
        // The just-appended Up must be the tail entry for this button.
        let up_pos = match self.entries.iter().rposition(|e| e.event.button == button) {
            Some(p) => p,
            None => return,
        };
        self.entries.remove(up_pos);

        // Scan backwards from the (now shifted) tail for the most
        // recent Down of the same button, requiring no other
        // button's entries in between.
        let mut down_pos = None;
        for i in (0..up_pos).rev() {
            if self.entries[i].event.button == button {
                down_pos = Some(i);
                break;
            } else {
                // Some other button's entry sits between the Up we
                // just removed and a same-button Down: the Down stays
                // live.
                return;
            }
        }
        if let Some(i) = down_pos {
            self.entries.remove(i);
        }
    }

    /// Optional compaction: drop trailing entries whose button is
    /// currently released and whose usage has reached a GC-eligible
    /// state (§4.2). `is_released` and `paired_down_removed` are
    /// supplied by the caller (the matcher, which owns pedal state).
    pub fn tail_trim<F, G>(&mut self, use_ceiling: u32, is_released: F, paired_down_removed: G)
    where
        F: Fn(Button) -> bool,
        G: Fn(Button, usize) -> bool,
    {
        while let Some(last) = self.entries.last() {
            let button = last.event.button;
            if !is_released(button) {
                break;
            }
            let idx = self.entries.len() - 1;
            if last.used >= use_ceiling || paired_down_removed(button, idx) {
                self.entries.pop();
            } else {
                break;
            }
        }
    }

    /// §4.4 phase 5: after release cleanup, if history exceeds the
    /// soft cap, drop the oldest entries whose button is not
    /// currently held. Never drops an entry for a button still held.
    pub fn trim_to_soft_cap<F>(&mut self, is_held: F)
    where
        F: Fn(Button) -> bool,
    {
        while self.entries.len() > self.soft_cap {
            // Find the oldest droppable entry (not held).
            match self.entries.iter().position(|e| !is_held(e.event.button)) {
                Some(idx) => {
                    self.entries.remove(idx);
                }
                None => break, // Every remaining button is held; can't shrink further.
            }
        }
    }
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, ButtonEvent};

    fn ev(button: Button, action: Action, t: u64) -> ButtonEvent {
        ButtonEvent { button, action, t }
    }

    #[test]
    fn release_pop_removes_adjacent_pair() {
        let mut h = History::new();
        h.append(ev(1, Action::Down, 0));
        h.append(ev(1, Action::Up, 10));
        h.release_pop(1);
        assert!(h.is_empty());
    }

    #[test]
    fn release_pop_leaves_down_live_when_interleaved() {
        let mut h = History::new();
        h.append(ev(1, Action::Down, 0));
        h.append(ev(2, Action::Down, 5));
        h.append(ev(2, Action::Up, 6));
        h.append(ev(1, Action::Up, 10));
        h.release_pop(1);
        // Only the trailing Up for button 1 is removed; its Down at
        // position 0 stays because button 2's events are in between.
        assert_eq!(h.len(), 3);
        assert_eq!(h.snapshot()[0].event.button, 1);
        assert_eq!(h.snapshot()[0].event.action, Action::Down);
    }

    #[test]
    fn soft_cap_never_drops_held_button() {
        let mut h = History::with_capacity(2);
        h.append(ev(1, Action::Down, 0));
        h.append(ev(2, Action::Down, 1));
        h.append(ev(3, Action::Down, 2));
        // Button 1 still held; 2 and 3 are not.
        h.trim_to_soft_cap(|b| b == 1);
        assert!(h.snapshot().iter().any(|e| e.event.button == 1));
        assert!(h.len() <= 2 || h.snapshot().iter().all(|e| e.event.button == 1));
    }
}
