//! Aggregated runtime statistics, reported on `--stats-json` or on
//! exit. Tracks rule fires and unknown-event drops rather than bounce
//! drops, but otherwise keeps the template's shape: a plain
//! accumulator owned by the logger thread, printable either as JSON or
//! to stderr.
//!
//! Grounded on `filter/stats.rs`'s `StatsCollector`.

use crate::util::format_us;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Per-rule fire count, completion-time samples, and the source line
/// it was declared on, so the human-readable report doesn't need the
/// full `Rule` to describe it.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RuleStats {
    pub source_line: u32,
    pub command: String,
    pub fire_count: u64,
    /// Microsecond span (earliest matched entry to trigger) of each
    /// fire, in firing order.
    pub timings_us: Vec<u64>,
}

impl RuleStats {
    fn min_avg_max(&self) -> Option<(u64, f64, u64)> {
        if self.timings_us.is_empty() {
            return None;
        }
        let min = *self.timings_us.iter().min().unwrap();
        let max = *self.timings_us.iter().max().unwrap();
        let sum: u64 = self.timings_us.iter().sum();
        let avg = sum as f64 / self.timings_us.len() as f64;
        Some((min, avg, max))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    pub events_processed: u64,
    pub events_with_fires: u64,
    pub total_fires: u64,
    /// Events whose `(type, code)` matched no configured binding and
    /// were dropped by the device layer (spec §7 `UnknownEventCode`).
    pub unknown_events: u64,
    per_rule: HashMap<usize, RuleStats>,
}

impl StatsCollector {
    pub fn new() -> Self {
        StatsCollector::default()
    }

    /// Record one processed event and the rules it caused to fire.
    pub fn record(&mut self, outcome: &crate::model::MatchOutcome) {
        self.events_processed += 1;
        if !outcome.fired.is_empty() {
            self.events_with_fires += 1;
        }
        for fired in &outcome.fired {
            self.total_fires += 1;
            let entry = self.per_rule.entry(fired.rule_id).or_insert_with(|| RuleStats {
                source_line: fired.source_line,
                command: fired.command.clone(),
                fire_count: 0,
                timings_us: Vec::new(),
            });
            entry.fire_count += 1;
            entry.timings_us.push(fired.span_us);
        }
    }

    /// Record `n` events dropped by the device layer for matching no
    /// configured binding (spec §7).
    pub fn record_unknown(&mut self, n: u64) {
        self.unknown_events += n;
    }

    pub fn print_to_stderr(&self) {
        eprintln!("--- pedal-macro status ---");
        eprintln!("Events processed: {}", self.events_processed);
        eprintln!("Events that triggered a rule: {}", self.events_with_fires);
        eprintln!("Total rule fires: {}", self.total_fires);
        eprintln!("Unknown/unbound events dropped: {}", self.unknown_events);
        if self.per_rule.is_empty() {
            eprintln!("(no rules fired)");
        } else {
            let mut rules: Vec<&RuleStats> = self.per_rule.values().collect();
            rules.sort_by_key(|r| r.source_line);
            eprintln!("Per-rule fire counts:");
            for r in rules {
                match r.min_avg_max() {
                    Some((min, avg, max)) => eprintln!(
                        "  line {}: {} fires ({}) -- span min/avg/max: {} / {} / {}",
                        r.source_line,
                        r.fire_count,
                        r.command,
                        format_us(min),
                        format_us(avg as u64),
                        format_us(max),
                    ),
                    None => eprintln!("  line {}: {} fires ({})", r.source_line, r.fire_count, r.command),
                }
            }
        }
        eprintln!("---------------------------");
    }

    pub fn print_json(&self, mut writer: impl Write) {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            events_processed: u64,
            events_with_fires: u64,
            total_fires: u64,
            unknown_events: u64,
            per_rule: &'a HashMap<usize, RuleStats>,
        }
        let output = JsonOutput {
            events_processed: self.events_processed,
            events_with_fires: self.events_with_fires,
            total_fires: self.total_fires,
            unknown_events: self.unknown_events,
            per_rule: &self.per_rule,
        };
        let _ = serde_json::to_writer_pretty(&mut writer, &output);
        let _ = writeln!(writer);
    }
}
