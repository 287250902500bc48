//! Command execution (spec §1: explicitly an external collaborator,
//! not part of the matched core). A small trait lets the matcher's
//! output drive either a real shell or, in tests, an in-memory
//! recorder — grounded on the template's own preference for a thin
//! seam (`event::read_event_raw`/`write_event_raw`) between the core
//! algorithm and raw OS interaction.

use std::process::Command;
use tracing::warn;

/// Runs the command string attached to a fired rule. Implementations
/// decide how (and whether) to actually execute it.
pub trait CommandSink: Send {
    fn run(&self, command: &str, source_line: u32);
}

/// Runs commands verbatim via `sh -c`, inheriting the process
/// environment and working directory (DESIGN.md Open Question 2: no
/// extra quoting or escaping is applied).
pub struct ShellCommandSink;

impl CommandSink for ShellCommandSink {
    fn run(&self, command: &str, source_line: u32) {
        match Command::new("sh").arg("-c").arg(command).spawn() {
            Ok(_) => {}
            Err(e) => warn!(source_line, command, error = %e, "failed to spawn command"),
        }
    }
}

/// Records invocations instead of executing them. Used by tests and
/// by `--debug` mode to show what would have run without side effects.
#[derive(Default)]
pub struct RecordingSink {
    pub invocations: std::sync::Mutex<Vec<(u32, String)>>,
}

impl CommandSink for RecordingSink {
    fn run(&self, command: &str, source_line: u32) {
        self.invocations
            .lock()
            .unwrap()
            .push((source_line, command.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_captures_invocations_in_order() {
        let sink = RecordingSink::default();
        sink.run("echo a", 3);
        sink.run("echo b", 7);
        let log = sink.invocations.lock().unwrap();
        assert_eq!(log.as_slice(), &[(3, "echo a".to_string()), (7, "echo b".to_string())]);
    }
}
