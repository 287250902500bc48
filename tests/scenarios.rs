//! Named scenarios exercising the full parse-then-match pipeline end
//! to end, against real configuration text.

use pedal_macro::model::{Action, ButtonEvent};
use test_helpers::matcher_from_config;

fn ev(button: u32, action: Action, t_ms: u64) -> ButtonEvent {
    ButtonEvent { button, action, t: t_ms * 1000 }
}

fn fired_commands(outcomes: &[pedal_macro::model::MatchOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .flat_map(|o| o.fired.iter().map(|f| f.command.clone()))
        .collect()
}

/// S1 -- max_use guards bare-N shorthand.
#[test]
fn s1_max_use_guards_bare_shorthand() {
    let mut m = matcher_from_config("1v,2: A\n1v,3: B\n1: C\n");
    let events = [
        ev(1, Action::Down, 0),
        ev(2, Action::Down, 10),
        ev(2, Action::Up, 20),
        ev(3, Action::Down, 30),
        ev(3, Action::Up, 40),
        ev(1, Action::Up, 50),
    ];
    let outcomes: Vec<_> = events.into_iter().map(|e| m.ingest(e)).collect();
    assert_eq!(fired_commands(&outcomes), vec!["A", "B"]);
    // Neither A nor B fires a second time off the release of button 2
    // or button 3: an Any-filtered last element fires on whichever
    // polarity completes the pattern first, not on both.
}

/// S2 -- bare-N fires as a tap when not shadowed by an earlier rule.
#[test]
fn s2_bare_n_taps_when_not_shadowed() {
    let mut m = matcher_from_config("1: C\n");
    let out1 = m.ingest(ev(1, Action::Down, 0));
    assert!(out1.fired.is_empty());
    let out2 = m.ingest(ev(1, Action::Up, 100));
    assert_eq!(fired_commands(&[out2]), vec!["C"]);
}

/// S3 -- an explicit press/release pair still fires even after its
/// press has already been consumed by an uncapped earlier rule.
#[test]
fn s3_explicit_pair_fires_despite_prior_use() {
    let mut m = matcher_from_config("1v,2: A\n1v,1^: D\n");
    let events = [
        ev(1, Action::Down, 0),
        ev(2, Action::Down, 10),
        ev(2, Action::Up, 20),
        ev(1, Action::Up, 30),
    ];
    let outcomes: Vec<_> = events.into_iter().map(|e| m.ingest(e)).collect();
    assert_eq!(fired_commands(&outcomes), vec!["A", "D"]);
}

/// S4 -- a time limit excludes a sequence that completes too slowly.
#[test]
fn s4_time_limit_excludes_slow_sequence() {
    let mut m = matcher_from_config("1v,2 < 0.100: FAST\n");
    let outcomes = vec![
        m.ingest(ev(1, Action::Down, 0)),
        m.ingest(ev(2, Action::Down, 250)),
    ];
    assert!(fired_commands(&outcomes).is_empty());
}

/// S5 -- overlapping timed rules all fire in declaration order when
/// each independently satisfies its own time limit.
#[test]
fn s5_overlapping_timed_rules_fire_in_declaration_order() {
    let mut m = matcher_from_config(
        "1,2,3 < 0.200: VFAST\n1,2,3 < 0.500: MED\n1,2,3 < 1.000: SLOW\n",
    );
    let events = [
        ev(1, Action::Down, 0),
        ev(1, Action::Up, 10),
        ev(2, Action::Down, 20),
        ev(2, Action::Up, 30),
        ev(3, Action::Down, 150),
        ev(3, Action::Up, 160),
    ];
    let outcomes: Vec<_> = events.into_iter().map(|e| m.ingest(e)).collect();
    assert_eq!(fired_commands(&outcomes), vec!["VFAST", "MED", "SLOW"]);
}

/// S6 -- a rule spanning two flattened button ranges (standing in for
/// two physical devices) fires exactly once per press/release cycle
/// of its `Any`-filtered last element, on whichever polarity completes
/// the pattern first, and never again on the opposite polarity of the
/// same cycle or on an unrelated button's later release.
#[test]
fn s6_cross_device_combination() {
    let mut m = matcher_from_config("1v,5: X\n");
    let events = [
        ev(1, Action::Down, 0),
        ev(5, Action::Down, 50),
        ev(5, Action::Up, 60),
        ev(1, Action::Up, 70),
    ];
    let outcomes: Vec<_> = events.into_iter().map(|e| m.ingest(e)).collect();
    assert_eq!(fired_commands(&outcomes), vec!["X"]);
}
