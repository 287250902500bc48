//! Property tests over the matcher/history core (spec §8 invariants
//! 1-5). Generalizes the template's `proptest`-driven event-stream
//! fuzzing from a single debounce filter to the full rule-matching
//! pipeline.

use pedal_macro::matcher::Matcher;
use pedal_macro::model::{Action, ActionFilter, Button, ButtonEvent, PatternElement, Rule};
use pedal_macro::parser;
use pedal_macro::state::PedalState;
use pedal_macro::history::History;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const MAX_BUTTONS: Button = 6;
/// Per-button cap on generated press/release pairs; with `MAX_BUTTONS`
/// buttons this bounds a stream at the same order of magnitude as the
/// old flat event cap.
const MAX_PAIRS_PER_BUTTON: usize = 25;

fn arb_action_filter() -> impl Strategy<Value = ActionFilter> {
    prop_oneof![
        Just(ActionFilter::DownOnly),
        Just(ActionFilter::UpOnly),
        Just(ActionFilter::Any),
    ]
}

fn arb_pattern_element() -> impl Strategy<Value = PatternElement> {
    (1..=MAX_BUTTONS, arb_action_filter(), prop::option::of(0u32..3)).prop_map(
        |(button, action_filter, max_use)| PatternElement { button, action_filter, max_use },
    )
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    (
        prop::collection::vec(arb_pattern_element(), 1..=4),
        prop::option::of(1u64..500_000),
    )
        .prop_map(|(sequence, limit_us)| Rule {
            sequence,
            time_limit: limit_us.map(Duration::from_micros),
            command: "true".to_string(),
            source_line: 1,
        })
}

fn arb_rules() -> impl Strategy<Value = Vec<Rule>> {
    prop::collection::vec(arb_rule(), 0..=4)
}

/// A stream of events, well-formed per the device contract (spec §6):
/// each button's own events strictly alternate Down, Up, Down, Up,
/// ... starting from Down, exactly what the device layer normalizes
/// raw input into. Buttons are interleaved with each other in
/// arbitrary order (a held button doesn't block other buttons'
/// events), but a single button never emits two Downs or two Ups back
/// to back, and never starts with an Up.
///
/// Built by generating each button's own alternating sequence
/// independently, then merging them via a random per-event sort key:
/// sorting preserves each button's relative (FIFO) order while letting
/// different buttons' events land in any relative position, so the
/// merged stream is genuinely interleaved rather than one button's
/// whole run followed by the next's.
fn arb_events() -> impl Strategy<Value = Vec<(Button, bool, u64)>> {
    let pair_counts = prop::collection::vec(0usize..=MAX_PAIRS_PER_BUTTON, MAX_BUTTONS as usize);
    pair_counts
        .prop_flat_map(|counts| {
            let total: usize = counts.iter().map(|p| p * 2).sum();
            let sort_keys = prop::collection::vec(any::<u32>(), total);
            let deltas = prop::collection::vec(1u64..1000, total);
            (Just(counts), sort_keys, deltas)
        })
        .prop_map(|(counts, sort_keys, deltas)| {
            let mut picks: Vec<Button> = Vec::new();
            for (bi, &pairs) in counts.iter().enumerate() {
                for _ in 0..(pairs * 2) {
                    picks.push(bi as Button + 1);
                }
            }
            let mut indexed: Vec<(u32, Button)> = sort_keys.into_iter().zip(picks).collect();
            indexed.sort_by_key(|&(key, _)| key);

            let mut next_is_down: HashMap<Button, bool> = HashMap::new();
            indexed
                .into_iter()
                .zip(deltas)
                .map(|((_, button), delta)| {
                    let down = *next_is_down.entry(button).or_insert(true);
                    next_is_down.insert(button, !down);
                    (button, down, delta)
                })
                .collect()
        })
}

fn to_events(raw: &[(Button, bool, u64)]) -> Vec<ButtonEvent> {
    let mut t = 0u64;
    raw.iter()
        .map(|&(button, down, delta)| {
            t = t.saturating_add(delta);
            ButtonEvent { button, action: if down { Action::Down } else { Action::Up }, t }
        })
        .collect()
}

/// One token shape of a hand-written config line: a bare tap, an
/// uncapped modifier, or an explicit suffix.
fn arb_token() -> impl Strategy<Value = String> {
    (1..=4u32, 0..3u8).prop_map(|(n, suffix)| match suffix {
        0 => n.to_string(),
        1 => format!("{n}v"),
        _ => format!("{n}^"),
    })
}

fn arb_rule_line() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(arb_token(), 1..=3),
        prop::option::of(1u32..100),
        "[A-Z]{1,6}",
    )
        .prop_map(|(tokens, limit_cs, command)| {
            let mut line = tokens.join(",");
            if let Some(cs) = limit_cs {
                line.push_str(&format!(" < {:.2}", cs as f64 / 100.0));
            }
            line.push_str(": ");
            line.push_str(&command);
            line
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Round-trip / idempotence (property 6) -- parsing a config and
    /// pretty-printing it re-parses to the same compiled rule list.
    #[test]
    fn prop_pretty_print_round_trips(lines in prop::collection::vec(arb_rule_line(), 1..=6)) {
        // Drop duplicate pattern lines; the parser rejects identical
        // rules as a semantic error, which isn't what this property
        // is about.
        let mut seen = HashSet::new();
        let mut src = String::new();
        for line in lines {
            let pattern = line.split(':').next().unwrap_or("").trim().to_string();
            if seen.insert(pattern) {
                src.push_str(&line);
                src.push('\n');
            }
        }
        prop_assume!(!src.is_empty());
        let Ok(cfg) = parser::load_str("t", &src) else { return Ok(()) };
        let printed = parser::pretty_print(&cfg);
        let reparsed = parser::load_str("t2", &printed).expect("pretty-printed config must re-parse");
        prop_assert_eq!(cfg.rules.len(), reparsed.rules.len());
        for (a, b) in cfg.rules.iter().zip(reparsed.rules.iter()) {
            prop_assert_eq!(&a.sequence, &b.sequence);
            prop_assert_eq!(a.time_limit, b.time_limit);
            prop_assert_eq!(&a.command, &b.command);
        }
    }

    /// Invariant 1 -- history pairing. After any sequence of events,
    /// every `Up` entry still in history is preceded (in history) by
    /// a `Down` for the same button with no other same-button entry
    /// between them.
    #[test]
    fn prop_history_pairing(rules in arb_rules(), raw in arb_events()) {
        let mut m = Matcher::new(rules, History::new(), PedalState::new());
        for event in to_events(&raw) {
            m.ingest(event);
        }
        let entries = m.history().snapshot();
        for (i, entry) in entries.iter().enumerate() {
            if entry.event.action == Action::Up {
                let down = entries[..i]
                    .iter()
                    .rev()
                    .find(|e| e.event.button == entry.event.button);
                prop_assert!(
                    matches!(down.map(|e| e.event.action), Some(Action::Down)),
                    "Up entry for button {} at index {} has no paired Down before it",
                    entry.event.button, i
                );
            }
        }
    }

    /// Invariant 2 -- monotone use. `used` never decreases for any
    /// entry still present in history. Entries are tracked by their
    /// event timestamp rather than position, since `trim_to_soft_cap`
    /// can remove from the middle of history, shifting later indices.
    #[test]
    fn prop_monotone_use(rules in arb_rules(), raw in arb_events()) {
        use std::collections::HashMap;
        let mut m = Matcher::new(rules, History::new(), PedalState::new());
        let mut last_seen: HashMap<u64, u32> = HashMap::new();
        for event in to_events(&raw) {
            m.ingest(event);
            for entry in m.history().snapshot() {
                let t = entry.event.t;
                if let Some(&prior) = last_seen.get(&t) {
                    prop_assert!(entry.used >= prior, "used decreased for entry at t={}", t);
                }
                last_seen.insert(t, entry.used);
            }
        }
    }

    /// Invariant 3 -- order preservation. The `(button, action)` pairs
    /// still in history, read oldest to newest, form a subsequence of
    /// the full ingested stream: history never reorders, only appends
    /// and selectively pops.
    #[test]
    fn prop_order_preservation(rules in arb_rules(), raw in arb_events()) {
        let events = to_events(&raw);
        let mut m = Matcher::new(rules, History::new(), PedalState::new());
        for event in &events {
            m.ingest(*event);
        }
        let remaining: Vec<(Button, Action)> = m
            .history()
            .snapshot()
            .iter()
            .map(|e| (e.event.button, e.event.action))
            .collect();
        let full: Vec<(Button, Action)> = events.iter().map(|e| (e.button, e.action)).collect();
        let mut it = full.iter();
        for pair in &remaining {
            let found = it.by_ref().any(|p| p == pair);
            prop_assert!(found, "history entry {:?} is not a subsequence of the ingested stream", pair);
        }
    }

    /// Invariant 4 -- determinism. Two fresh matchers fed the same
    /// rules and the same event stream produce identical command
    /// sequences.
    #[test]
    fn prop_determinism(rules in arb_rules(), raw in arb_events()) {
        let events = to_events(&raw);
        let mut m1 = Matcher::new(rules.clone(), History::new(), PedalState::new());
        let mut m2 = Matcher::new(rules, History::new(), PedalState::new());
        let out1: Vec<String> = events.iter().flat_map(|&e| m1.ingest(e).fired.into_iter().map(|f| f.command)).collect();
        let out2: Vec<String> = events.iter().flat_map(|&e| m2.ingest(e).fired.into_iter().map(|f| f.command)).collect();
        prop_assert_eq!(out1, out2);
    }

    /// Invariant 5 -- declaration-order fire set. Within a single
    /// event's outcome, fired rule ids are strictly increasing (the
    /// scan visits rules in source order and only appends on match).
    #[test]
    fn prop_declaration_order_fire_set(rules in arb_rules(), raw in arb_events()) {
        let mut m = Matcher::new(rules, History::new(), PedalState::new());
        for event in to_events(&raw) {
            let out = m.ingest(event);
            let ids: Vec<_> = out.fired.iter().map(|f| f.rule_id).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            prop_assert_eq!(ids, sorted, "fired rule ids were not in declaration order");
        }
    }
}
