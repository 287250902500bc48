//! Plain data types shared by the parser, history, state, and matcher
//! modules. Nothing in this module owns a mutable engine; it's the
//! vocabulary the rest of the crate operates on.

use serde::Serialize;

/// A small positive integer identifying one physical control, after
/// cross-device flattening. Opaque to the core — only the device
/// layer knows which device/code it came from.
pub type Button = u32;

/// Index of a [`Rule`] within the compiled, declaration-ordered rule
/// list. Used to attribute fires in stats/logging without comparing
/// whole `Rule` values.
pub type RuleId = usize;

/// One edge of a physical switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Down,
    Up,
}

/// A single normalized input event delivered by the device layer.
/// Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonEvent {
    pub button: Button,
    pub action: Action,
    /// Monotonic microsecond timestamp, source-defined epoch.
    pub t: u64,
}

/// One entry in the event [`History`](crate::history::History): an
/// event plus a mutable use counter.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub event: ButtonEvent,
    /// Number of times this entry has been consumed as a matched
    /// sequence element by a firing rule. Starts at 0, monotonically
    /// non-decreasing.
    pub used: u32,
}

impl HistoryEntry {
    pub fn new(event: ButtonEvent) -> Self {
        HistoryEntry { event, used: 0 }
    }
}

/// Which polarity of a button a [`PatternElement`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionFilter {
    DownOnly,
    UpOnly,
    Any,
}

impl ActionFilter {
    /// Does this filter accept the given action?
    pub fn accepts(&self, action: Action) -> bool {
        match self {
            ActionFilter::DownOnly => action == Action::Down,
            ActionFilter::UpOnly => action == Action::Up,
            ActionFilter::Any => true,
        }
    }
}

/// One position within a rule's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternElement {
    pub button: Button,
    pub action_filter: ActionFilter,
    /// Cap on how many times the history entry this element matches
    /// may have previously participated in other rule matches.
    /// `Some(0)` means "only if never used"; `None` means no cap.
    pub max_use: Option<u32>,
}

impl PatternElement {
    /// Does this element match the given history entry, ignoring
    /// position? (button identity, action polarity, and `max_use`.)
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        self.button == entry.event.button
            && self.action_filter.accepts(entry.event.action)
            && self.max_use.map_or(true, |m| entry.used <= m)
    }
}

/// One compiled rule: a sequence of pattern elements, an optional
/// timing constraint, and the command to run on a match.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub sequence: Vec<PatternElement>,
    /// Elapsed time between the earliest matched entry and the
    /// current entry must be within this limit, if set.
    pub time_limit: Option<std::time::Duration>,
    pub command: String,
    /// 1-based line number in the source config, for diagnostics.
    pub source_line: u32,
}

impl Rule {
    /// A rule "fires on press" if its last element only accepts
    /// `Down`; otherwise it "fires on release" (including `Any`,
    /// which fires on whichever polarity arrives).
    pub fn fires_on_press(&self) -> bool {
        matches!(
            self.sequence.last().map(|e| e.action_filter),
            Some(ActionFilter::DownOnly)
        )
    }

    /// Does this event's action match the rule's overall firing
    /// polarity (§4.4 phase 2, first bullet)?
    pub fn polarity_matches(&self, action: Action) -> bool {
        match self.sequence.last() {
            Some(elem) => elem.action_filter.accepts(action),
            None => false,
        }
    }
}

/// Either a bare key code (`EV_KEY`) or an explicit `type/code=value`
/// triple, resolved at parse time from symbolic names or integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCodeSpec {
    pub ev_type: u16,
    pub code: u16,
    /// The literal value from an explicit `type/code=value` triple.
    /// `None` when the spec was written as a bare key code (`EV_KEY`
    /// is implied, and value is determined at runtime: 1 = down,
    /// 0 = up). For `EV_REL` bindings this is the signed axis value
    /// that triggers a synthetic press/release pair.
    pub value: Option<i32>,
}

impl EventCodeSpec {
    /// `EV_REL` bindings are auto-release: a synthetic Down
    /// immediately followed by an Up, per §6.
    pub fn is_auto_release(&self) -> bool {
        self.ev_type == input_linux_sys::EV_REL as u16
    }
}

/// Assigns global, 1-based button numbers to the flat concatenation
/// of each binding's code list, in declaration order (spec §3/§6).
/// Returns one entry per `(binding_index, code_index)` pair, in the
/// same order device events will be normalized.
pub fn flatten_button_numbers(bindings: &[DeviceBinding]) -> Vec<(usize, usize, Button)> {
    let mut out = Vec::new();
    let mut next = 1u32;
    for (bi, binding) in bindings.iter().enumerate() {
        for (ci, _) in binding.codes.iter().enumerate() {
            out.push((bi, ci, next));
            next += 1;
        }
    }
    out
}

/// One `dev:` line: a device path, its flattened list of event-code
/// bindings (each becomes one global button number), and whether the
/// device is opened non-exclusively.
#[derive(Debug, Clone)]
pub struct DeviceBinding {
    pub path: String,
    pub codes: Vec<EventCodeSpec>,
    pub shared: bool,
}

/// The result of successfully parsing one configuration file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub rules: Vec<Rule>,
    pub bindings: Vec<DeviceBinding>,
}

/// What happened when the matcher processed one incoming event: which
/// rules fired (in firing order) and their commands. Purely
/// observational — built after `used` counters are committed, never
/// consulted by later matching.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub event: ButtonEvent,
    pub fired: Vec<FiredRule>,
}

#[derive(Debug, Clone)]
pub struct FiredRule {
    pub rule_id: RuleId,
    pub command: String,
    pub source_line: u32,
    /// Elapsed microseconds between the earliest history entry the
    /// match consumed and the triggering event, i.e. how long the
    /// pattern took to complete. Same clock `time_limit` is checked
    /// against.
    pub span_us: u64,
}
