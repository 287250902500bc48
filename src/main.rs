// Main application entry point.
// Orchestrates command-line parsing, device thread setup, the match
// loop, signal handling, and final shutdown/stats reporting.

use crossbeam_channel::{bounded, Receiver, Sender};
use pedal_macro::cli;
use pedal_macro::config::Config;
use pedal_macro::device::{self, DeviceReader};
use pedal_macro::logger::{LogMessage, Logger};
use pedal_macro::matcher::Matcher;
use pedal_macro::model::{flatten_button_numbers, ButtonEvent};
use pedal_macro::parser;
use pedal_macro::sink::ShellCommandSink;
use pedal_macro::state::PedalState;
use pedal_macro::stats::StatsCollector;
use pedal_macro::{history::History, telemetry};
use signal_hook::consts::signal::*;
use signal_hook::iterator::Signals;
use std::process::exit;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use tracing::{error, warn};

fn main() -> std::io::Result<()> {
    let args = cli::parse_args();

    if args.list_devices {
        eprintln!("Scanning input devices (requires read access to /dev/input/event*)...");
        if let Err(e) = device::list_devices() {
            eprintln!("Error listing devices: {e}");
            exit(2);
        }
        return Ok(());
    }

    let config = Config::from(&args);
    telemetry::init_tracing(&config);

    let Some(config_path) = args.config.as_deref() else {
        error!("--config is required unless --list-devices is given");
        exit(1);
    };

    let loaded = match parser::load_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            exit(1);
        }
    };

    let button_numbers = flatten_button_numbers(&loaded.bindings);
    let button_count = button_numbers.len() as u32 + 1;

    let matcher = Arc::new(Mutex::new(Matcher::new(
        loaded.rules,
        History::with_capacity(config.history_cap),
        PedalState::with_button_count(button_count as usize),
    )));

    let main_running = Arc::new(AtomicBool::new(true));
    let logger_running = Arc::new(AtomicBool::new(true));

    let (event_sender, event_receiver): (Sender<ButtonEvent>, Receiver<ButtonEvent>) = bounded(1024);
    let (log_sender, log_receiver): (Sender<LogMessage>, Receiver<LogMessage>) = bounded(1024);

    // One reader thread per configured device, fanning in to the main
    // thread's single ordered event channel. Spec §1/§5 treats the
    // multi-device fan-in as an external collaborator of the matched
    // core; only the matcher itself is order-sensitive, so fan-in
    // here need only preserve arrival order as seen by this process.
    let mut device_handles = Vec::new();
    for (bi, binding) in loaded.bindings.iter().enumerate() {
        let numbers: Vec<_> = button_numbers
            .iter()
            .filter(|(b, _, _)| *b == bi)
            .map(|(_, _, n)| *n)
            .collect();
        let reader = match DeviceReader::open(binding, &numbers) {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, path = %binding.path, "failed to open device");
                exit(1);
            }
        };
        let sender = event_sender.clone();
        let running = Arc::clone(&main_running);
        let log_sender_for_device = log_sender.clone();
        device_handles.push(thread::spawn(move || {
            device_thread_loop(reader, sender, log_sender_for_device, running)
        }));
    }
    drop(event_sender);

    let logger_config = Arc::new(config.clone());
    let logger_running_clone = Arc::clone(&logger_running);
    let logger_handle: JoinHandle<StatsCollector> = thread::spawn(move || {
        let mut logger = Logger::new(log_receiver, logger_running_clone, logger_config, Box::new(ShellCommandSink));
        logger.run()
    });

    let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT])?;
    let main_running_clone = Arc::clone(&main_running);
    let logger_running_for_signal = Arc::clone(&logger_running);
    let log_sender_for_signal = log_sender.clone();
    thread::spawn(move || {
        if signals.forever().next().is_some() {
            main_running_clone.store(false, Ordering::SeqCst);
            logger_running_for_signal.store(false, Ordering::SeqCst);
            drop(log_sender_for_signal);
        }
    });

    while main_running.load(Ordering::SeqCst) {
        match event_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(event) => {
                let outcome = match matcher.lock() {
                    Ok(mut m) => m.ingest(event),
                    Err(poisoned) => {
                        warn!("matcher mutex poisoned; continuing with recovered state");
                        poisoned.into_inner().ingest(event)
                    }
                };
                if log_sender.send(LogMessage::Outcome(outcome)).is_err() {
                    warn!("logger channel disconnected; stopping");
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    main_running.store(false, Ordering::SeqCst);
    logger_running.store(false, Ordering::SeqCst);
    drop(log_sender);

    for handle in device_handles {
        let _ = handle.join();
    }

    match logger_handle.join() {
        Ok(stats) => {
            if config.stats_json {
                stats.print_json(std::io::stderr().lock());
            } else {
                stats.print_to_stderr();
            }
        }
        Err(_) => error!("logger thread panicked"),
    }

    Ok(())
}

/// Per-device read loop: normalizes raw events and forwards them to
/// the main thread until the device is lost or shutdown is signaled.
fn device_thread_loop(
    mut reader: DeviceReader,
    sender: Sender<ButtonEvent>,
    log_sender: Sender<LogMessage>,
    running: Arc<AtomicBool>,
) {
    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let outcome = reader.next_button_event();
        let unknown = reader.take_unknown_count();
        if unknown > 0 && log_sender.send(LogMessage::UnknownEvents(unknown)).is_err() {
            break;
        }
        match outcome {
            Ok(Some(event)) => {
                if sender.send(event).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, path = reader.path(), "device lost");
                break;
            }
        }
    }
}
