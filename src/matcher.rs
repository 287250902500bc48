//! Component D: the matcher/dispatcher (spec §4.4), the busiest module
//! in the core. Ingests one [`ButtonEvent`] at a time and decides
//! which rules fire.
//!
//! Grounded on `BounceFilter::filter_event` in the template: a single
//! `&mut self` entry point that updates internal state, inspects
//! history, and returns a decision — generalized here from "drop or
//! keep one event" to "collect zero or more rule fires".

use crate::history::History;
use crate::model::{Action, ActionFilter, Button, ButtonEvent, FiredRule, MatchOutcome, Rule, RuleId};
use crate::state::PedalState;
use std::collections::HashSet;

/// Ceiling on `used` below which a history entry is still considered
/// for soft-cap tail trimming (spec §4.2/§4.4 phase 5). Entries that
/// have been consumed at least this many times are eligible for
/// eager collection even before the soft cap is hit.
const TAIL_TRIM_USE_CEILING: u32 = 1;

pub struct Matcher {
    rules: Vec<Rule>,
    history: History,
    state: PedalState,
    /// `(rule, button)` pairs already fired via an `Any`-filtered last
    /// element for the button's current press cycle. An `Any` tail
    /// qualifies on both the press and the release of the button it
    /// names; without this, an uncapped earlier element (the usual
    /// shape for a modifier held across several rules) lets the same
    /// rule fire twice for one physical press/release instead of once
    /// "at the moment that polarity arrives" (spec §4.4/§9 OQ1).
    /// Cleared for a button once its release is processed.
    any_tail_fired: HashSet<(RuleId, Button)>,
    /// Buttons that appear at a non-last position in some rule whose
    /// sequence spans more than one distinct button. `release_pop`
    /// must not collapse such a button's press/release pair the
    /// instant it completes: a later event on a different button may
    /// still need it as an anchor for a time-windowed combination
    /// match. Single-button rules (the bare-N tap shorthand) are
    /// excluded, since their own pair is meant to self-consume.
    combo_anchors: HashSet<Button>,
}

impl Matcher {
    pub fn new(rules: Vec<Rule>, history: History, state: PedalState) -> Self {
        let mut combo_anchors = HashSet::new();
        for rule in &rules {
            let distinct_buttons: HashSet<Button> = rule.sequence.iter().map(|e| e.button).collect();
            if distinct_buttons.len() > 1 {
                for elem in &rule.sequence[..rule.sequence.len() - 1] {
                    combo_anchors.insert(elem.button);
                }
            }
        }
        Matcher {
            rules,
            history,
            state,
            any_tail_fired: HashSet::new(),
            combo_anchors,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Process one incoming event end to end (§4.4 phases 1-5) and
    /// return the set of rules it caused to fire, in declaration
    /// order.
    pub fn ingest(&mut self, event: ButtonEvent) -> MatchOutcome {
        // Phase 1: update pedal state and append to history.
        self.state.apply(event.button, event.action);
        self.history.append(event);

        // Phase 2 & 3: scan rules in declaration order, tail-aligned
        // greedy-from-tail injection matching, committing `used`
        // counters as each rule fires.
        let mut fired = Vec::new();
        for rule_idx in 0..self.rules.len() {
            if !self.rules[rule_idx].polarity_matches(event.action) {
                continue;
            }
            let last_is_any = self.rules[rule_idx]
                .sequence
                .last()
                .is_some_and(|e| e.action_filter == ActionFilter::Any);
            if last_is_any && self.any_tail_fired.contains(&(rule_idx as RuleId, event.button)) {
                continue;
            }
            if let Some((match_indices, span_us)) = self.try_match(rule_idx, event.t) {
                for &idx in &match_indices {
                    self.history.entry_mut(idx).used += 1;
                }
                let rule = &self.rules[rule_idx];
                fired.push(FiredRule {
                    rule_id: rule_idx as RuleId,
                    command: rule.command.clone(),
                    source_line: rule.source_line,
                    span_us,
                });
                if last_is_any {
                    self.any_tail_fired.insert((rule_idx as RuleId, event.button));
                }
            }
        }

        // Phase 4: release cleanup. An Up event that ends the life of
        // its button's most recent Down/Up pair triggers pop of both,
        // provided nothing else intervened and no multi-button rule
        // still anchors on this button for a later combination match.
        if event.action == Action::Up {
            if !self.combo_anchors.contains(&event.button) {
                self.history.release_pop(event.button);
            }
            self.any_tail_fired.retain(|&(_, b)| b != event.button);
        }

        // Phase 5: bounded growth. Eagerly collect heavily-used
        // trailing entries for released buttons, then enforce the
        // soft cap.
        let state = &self.state;
        self.history.tail_trim(
            TAIL_TRIM_USE_CEILING,
            |b| !state.is_pressed(b),
            |_, _| false,
        );
        let state = &self.state;
        self.history.trim_to_soft_cap(|b| state.is_pressed(b));

        MatchOutcome { event, fired }
    }

    /// Try to match `rule`'s sequence against the tail of history,
    /// searching backward from the newest entry. Elements are matched
    /// greedily from the rule's last element to its first: each
    /// element must match some history entry strictly older (by
    /// index) than the one matched by the element after it, but
    /// intervening unmatched history entries are allowed (injection,
    /// not exact contiguity) as long as they don't match-block the
    /// element currently being sought to an earlier point than
    /// necessary. Returns the matched history indices in sequence
    /// order together with the pattern's completion span (microseconds
    /// between the earliest matched entry and `now`), or `None` if the
    /// full sequence can't be found or the rule's time limit is
    /// exceeded.
    fn try_match(&self, rule_idx: usize, now: u64) -> Option<(Vec<usize>, u64)> {
        let rule = &self.rules[rule_idx];
        if rule.sequence.is_empty() {
            return None;
        }
        let entries = self.history.snapshot();
        if entries.is_empty() {
            return None;
        }

        // The rule's final element must match the just-appended tail
        // entry exactly (this is what makes the event the trigger).
        let last_idx = entries.len() - 1;
        if !rule.sequence[rule.sequence.len() - 1].matches(&entries[last_idx]) {
            return None;
        }

        let mut matched = vec![0usize; rule.sequence.len()];
        matched[rule.sequence.len() - 1] = last_idx;
        let mut search_ceiling = last_idx;

        for i in (0..rule.sequence.len() - 1).rev() {
            let elem = &rule.sequence[i];
            let found = (0..search_ceiling).rev().find(|&idx| elem.matches(&entries[idx]));
            match found {
                Some(idx) => {
                    matched[i] = idx;
                    search_ceiling = idx;
                }
                None => return None,
            }
        }

        let earliest_t = entries[matched[0]].event.t;
        let span_us = now.saturating_sub(earliest_t);
        if let Some(limit) = rule.time_limit {
            if span_us > limit.as_micros() as u64 {
                return None;
            }
        }

        Some((matched, span_us))
    }
}
