use clap::Parser;

/// A programmable macro engine for foot pedals and other evdev input
/// devices. Reads a configuration file mapping button sequences to
/// shell commands, listens on one or more input devices, and runs the
/// matching command whenever a rule's pattern is satisfied.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "A programmable macro engine for foot pedals and other evdev input devices.\n\
Reads a configuration file mapping button sequences to shell commands, grabs the\n\
configured input devices, and runs matching commands as patterns complete.\n\
\n\
EXAMPLES:\n\
  # Run with a config file:\n\
  sudo pedal-macro --config pedals.conf\n\
\n\
  # See what would fire without executing anything:\n\
  sudo pedal-macro --config pedals.conf --debug\n\
\n\
  # List available input devices:\n\
  pedal-macro --list-devices\n\
\n\
See README for the configuration file format."
)]
pub struct Args {
    /// Path to the pattern/command configuration file.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<String>,

    /// Suppress informational logging; only warnings and errors are printed.
    #[arg(short = 'q', long, action = clap::ArgAction::SetTrue)]
    pub quiet: bool,

    /// Log every event and would-be rule fire without executing commands.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub debug: bool,

    /// List available input devices and their capabilities (requires root).
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub list_devices: bool,

    /// Output statistics as JSON to stderr on exit and periodic dump.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub stats_json: bool,

    /// Periodically dump statistics to stderr every S seconds (default: 0 = disabled).
    #[arg(long, default_value = "0", value_name = "SECONDS")]
    pub log_interval: u64,

    /// Soft cap on retained event history length before old, released
    /// entries are trimmed.
    #[arg(long, default_value_t = crate::history::DEFAULT_SOFT_CAP, value_name = "N")]
    pub history_cap: usize,
}

pub fn parse_args() -> Args {
    Args::parse()
}
