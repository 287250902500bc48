//! Runtime configuration, derived from parsed CLI arguments.
//! Grounded on `config.rs`'s `From<&cli::Args>` conversion.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub config_path: String,
    pub quiet: bool,
    pub debug: bool,
    pub stats_json: bool,
    pub log_interval: Duration,
    pub history_cap: usize,
}

impl From<&crate::cli::Args> for Config {
    fn from(a: &crate::cli::Args) -> Self {
        Config {
            config_path: a.config.clone().unwrap_or_default(),
            quiet: a.quiet,
            debug: a.debug,
            stats_json: a.stats_json,
            log_interval: Duration::from_secs(a.log_interval),
            history_cap: a.history_cap,
        }
    }
}
