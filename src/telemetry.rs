//! Tracing subscriber initialization. Grounded on `telemetry.rs`'s
//! `init_tracing`, minus the OpenTelemetry OTLP export pipeline: this
//! process has no distributed collector downstream of it, so the
//! fmt layer alone is the whole story.

use crate::config::Config;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_tracing(cfg: &Config) {
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(cfg.debug).with_level(true);

    let default_filter = if cfg.quiet {
        "pedal_macro=warn"
    } else if cfg.debug {
        "pedal_macro=debug"
    } else {
        "pedal_macro=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry().with(fmt_layer).with(filter).init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_sha = option_env!("VERGEN_GIT_SHA_SHORT").unwrap_or("unknown"),
        "pedal-macro starting"
    );
}
