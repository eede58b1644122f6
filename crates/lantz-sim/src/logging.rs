//! Diagnostics setup
//!
//! Logs go to stderr so that stdout carries only the dispatch status line and
//! whatever the simulator prints itself.

use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives, e.g. `lantz_simulators=debug`
pub const LOG_ENV: &str = "LANTZ_SIM_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Pick the first set of directives that parses: `LANTZ_SIM_LOG`, then
/// `RUST_LOG`, then `info`
pub fn filter_from(primary: Option<&str>, fallback: Option<&str>) -> EnvFilter {
    [primary, fallback]
        .into_iter()
        .flatten()
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let primary = std::env::var(LOG_ENV).ok();
    let fallback = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_from(primary.as_deref(), fallback.as_deref());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
