//! Common fixture builders shared by `tests/`, `benches/`, and the
//! fuzz targets. Generalizes the template's own `test-helpers`
//! crate: small, free-standing constructors for the domain's plain
//! data types, with no behavior of their own.

use pedal_macro::matcher::Matcher;
use pedal_macro::model::{Action, ActionFilter, Button, ButtonEvent, PatternElement, Rule};
use pedal_macro::state::PedalState;
use pedal_macro::{history::History, parser};

/// A `Down` event for `button` at time `t` (microseconds).
pub fn down(button: Button, t: u64) -> ButtonEvent {
    ButtonEvent { button, action: Action::Down, t }
}

/// An `Up` event for `button` at time `t` (microseconds).
pub fn up(button: Button, t: u64) -> ButtonEvent {
    ButtonEvent { button, action: Action::Up, t }
}

/// One sequence element, for building `Rule`s by hand without the
/// parser.
pub fn elem(button: Button, action_filter: ActionFilter, max_use: Option<u32>) -> PatternElement {
    PatternElement { button, action_filter, max_use }
}

/// A compiled rule over the given sequence, with no time limit.
pub fn rule(sequence: Vec<PatternElement>, command: &str) -> Rule {
    Rule {
        sequence,
        time_limit: None,
        command: command.to_string(),
        source_line: 1,
    }
}

/// A compiled rule with an explicit time limit.
pub fn timed_rule(sequence: Vec<PatternElement>, limit: std::time::Duration, command: &str) -> Rule {
    Rule {
        sequence,
        time_limit: Some(limit),
        command: command.to_string(),
        source_line: 1,
    }
}

/// The desugared "tap" pattern a bare `N` alone produces: press then
/// release of `button`, each usable only once.
pub fn tap_sequence(button: Button) -> Vec<PatternElement> {
    vec![
        elem(button, ActionFilter::DownOnly, Some(0)),
        elem(button, ActionFilter::UpOnly, Some(0)),
    ]
}

/// A fresh `Matcher` over the given rules, with default history
/// capacity and no pre-existing pedal state.
pub fn matcher(rules: Vec<Rule>) -> Matcher {
    Matcher::new(rules, History::new(), PedalState::new())
}

/// Parses an in-memory configuration string, panicking on failure.
/// Callers that want to exercise parse errors should call
/// `pedal_macro::parser::load_str` directly instead.
pub fn load_config(text: &str) -> pedal_macro::model::LoadedConfig {
    parser::load_str("<test>", text).expect("fixture config should parse")
}

/// Builds a `Matcher` directly from a configuration string, skipping
/// the device layer entirely. Most matcher-level tests only need the
/// rules this produces.
pub fn matcher_from_config(text: &str) -> Matcher {
    let loaded = load_config(text);
    matcher(loaded.rules)
}
