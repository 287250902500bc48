//! Background thread that drains match outcomes from the main loop,
//! dispatches fired commands, logs via `tracing`, and periodically
//! dumps statistics.
//!
//! Grounded on `logger.rs`'s `Logger::run` loop: a `recv_timeout`
//! poll against a shutdown flag, with a periodic dump timer checked
//! each iteration.

use crate::config::Config;
use crate::model::MatchOutcome;
use crate::sink::CommandSink;
use crate::stats::StatsCollector;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

pub enum LogMessage {
    Outcome(MatchOutcome),
    /// `n` events dropped by a device reader for matching no
    /// configured binding (spec §7 `UnknownEventCode`).
    UnknownEvents(u64),
}

pub struct Logger {
    receiver: Receiver<LogMessage>,
    running: Arc<AtomicBool>,
    config: Arc<Config>,
    sink: Box<dyn CommandSink>,
    cumulative_stats: StatsCollector,
    interval_stats: StatsCollector,
    last_dump_time: Instant,
}

impl Logger {
    pub fn new(
        receiver: Receiver<LogMessage>,
        running: Arc<AtomicBool>,
        config: Arc<Config>,
        sink: Box<dyn CommandSink>,
    ) -> Self {
        Logger {
            receiver,
            running,
            config,
            sink,
            cumulative_stats: StatsCollector::new(),
            interval_stats: StatsCollector::new(),
            last_dump_time: Instant::now(),
        }
    }

    /// Runs until `running` is cleared and the channel drains.
    /// Returns the cumulative statistics collected over the run.
    pub fn run(&mut self) -> StatsCollector {
        debug!("logger thread started");
        let check_interval = Duration::from_millis(100);

        loop {
            if !self.running.load(Ordering::SeqCst) {
                debug!("shutdown signaled, draining channel");
                while let Ok(msg) = self.receiver.try_recv() {
                    self.process_message(msg);
                }
                break;
            }

            if self.config.log_interval > Duration::ZERO && self.last_dump_time.elapsed() >= self.config.log_interval {
                self.dump_periodic_stats();
                self.last_dump_time = Instant::now();
            }

            match self.receiver.recv_timeout(check_interval) {
                Ok(msg) => self.process_message(msg),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    while let Ok(msg) = self.receiver.try_recv() {
                        self.process_message(msg);
                    }
                    break;
                }
            }
        }

        debug!("logger thread exiting");
        std::mem::take(&mut self.cumulative_stats)
    }

    #[instrument(name = "logger_process_message", skip(self, msg))]
    fn process_message(&mut self, msg: LogMessage) {
        match msg {
            LogMessage::Outcome(outcome) => {
                self.cumulative_stats.record(&outcome);
                self.interval_stats.record(&outcome);

                for fired in &outcome.fired {
                    info!(
                        button = outcome.event.button,
                        rule_id = fired.rule_id,
                        source_line = fired.source_line,
                        command = %fired.command,
                        "rule fired"
                    );
                    if !self.config.debug {
                        self.sink.run(&fired.command, fired.source_line);
                    } else {
                        info!(command = %fired.command, "debug mode: not executing");
                    }
                }

                if self.config.debug && outcome.fired.is_empty() {
                    tracing::trace!(button = outcome.event.button, ?outcome.event.action, "event with no fires");
                }
            }
            LogMessage::UnknownEvents(n) => {
                self.cumulative_stats.record_unknown(n);
                self.interval_stats.record_unknown(n);
            }
        }
    }

    #[instrument(name = "dump_periodic_stats", skip(self))]
    fn dump_periodic_stats(&mut self) {
        info!(target: "stats", interval = %crate::util::format_duration(self.config.log_interval), "periodic stats dump");
        let snapshot = std::mem::take(&mut self.interval_stats);
        if self.config.stats_json {
            snapshot.print_json(std::io::stderr().lock());
        } else {
            snapshot.print_to_stderr();
        }
    }
}
