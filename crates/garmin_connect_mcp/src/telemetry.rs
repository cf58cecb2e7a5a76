//! Logging setup shared by the stdio and HTTP binaries.
//!
//! Logs always go to stderr: on the stdio transport stdout carries MCP frames.

use tracing_subscriber::EnvFilter;

/// Per-target overrides that keep rmcp internals quiet by default.
pub const QUIET_TARGETS: &str = "rmcp=warn,serve_inner=warn";
const FALLBACK_FILTER: &str = "info,rmcp=warn,serve_inner=warn";

/// Log level from `GARMIN_LOG_LEVEL`, then `RUST_LOG`, default `info`.
pub fn log_level_from_env() -> String {
    log_level_with(|k| std::env::var(k).ok())
}

pub fn log_level_with<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get("GARMIN_LOG_LEVEL")
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

/// Build the filter, falling back to `info` when the directive does not parse.
pub fn env_filter(level: &str) -> EnvFilter {
    let combined = format!("{},{}", level, QUIET_TARGETS);
    EnvFilter::try_new(combined).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber and return the level in effect.
pub fn init() -> String {
    let level = log_level_from_env();
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(&level))
        .init();
    level
}
