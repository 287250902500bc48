#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use pedal_macro::history::History;
use pedal_macro::matcher::Matcher;
use pedal_macro::model::{Action, ActionFilter, Button, ButtonEvent, PatternElement, Rule};
use pedal_macro::state::PedalState;
use std::time::Duration;

const MAX_BUTTONS: Button = 8;
const MAX_RULES: usize = 4;
const MAX_SEQ: usize = 4;
const MAX_EVENTS: usize = 256;

#[derive(Arbitrary, Debug)]
struct ArbElement {
    button: u8,
    filter: u8,
    capped: bool,
}

impl ArbElement {
    fn into_pattern_element(self) -> PatternElement {
        let action_filter = match self.filter % 3 {
            0 => ActionFilter::DownOnly,
            1 => ActionFilter::UpOnly,
            _ => ActionFilter::Any,
        };
        PatternElement {
            button: (self.button as Button) % MAX_BUTTONS,
            action_filter,
            max_use: if self.capped { Some(0) } else { None },
        }
    }
}

#[derive(Arbitrary, Debug)]
struct ArbRule {
    seq: Vec<ArbElement>,
    timed: bool,
    limit_ms: u16,
}

#[derive(Arbitrary, Debug)]
struct ArbEvent {
    button: u8,
    down: bool,
    delta_us: u16,
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    let raw_rules: Vec<ArbRule> = match Vec::arbitrary(&mut u) {
        Ok(v) => v,
        Err(_) => return,
    };
    let rules: Vec<Rule> = raw_rules
        .into_iter()
        .take(MAX_RULES)
        .filter_map(|r| {
            let sequence: Vec<PatternElement> = r
                .seq
                .into_iter()
                .take(MAX_SEQ)
                .map(ArbElement::into_pattern_element)
                .collect();
            if sequence.is_empty() {
                return None;
            }
            Some(Rule {
                sequence,
                time_limit: if r.timed {
                    Some(Duration::from_millis(r.limit_ms as u64))
                } else {
                    None
                },
                command: "true".to_string(),
                source_line: 1,
            })
        })
        .collect();

    let raw_events: Vec<ArbEvent> = match Vec::arbitrary(&mut u) {
        Ok(v) => v,
        Err(_) => return,
    };

    let mut matcher = Matcher::new(rules, History::with_capacity(32), PedalState::new());
    let mut t = 0u64;
    for e in raw_events.into_iter().take(MAX_EVENTS) {
        t = t.saturating_add(e.delta_us as u64);
        let event = ButtonEvent {
            button: (e.button as Button) % MAX_BUTTONS,
            action: if e.down { Action::Down } else { Action::Up },
            t,
        };
        // The only property under test here is the absence of panics
        // across an arbitrary event stream; repeated presses of a
        // held button are exempt from the soft cap, so history length
        // itself isn't a useful invariant to assert on.
        let _ = matcher.ingest(event);
    }
});
