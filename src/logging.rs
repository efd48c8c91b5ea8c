//! Subscriber setup for the binary. Library code only emits events.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "SCHEMAPROBE_LOG";

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "schemaprobe=warn",
        1 => "schemaprobe=info",
        2 => "schemaprobe=debug",
        _ => "schemaprobe=trace,sqlx=debug",
    }
}

/// Builds the filter from `SCHEMAPROBE_LOG`, then `RUST_LOG`, then the
/// verbosity flag.
pub fn env_filter(verbose: u8) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

/// Installs a stderr fmt subscriber so report output on stdout stays
/// machine readable. Does nothing if a global subscriber is already set.
pub fn init_logging(verbose: u8) {
    let _ = fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
