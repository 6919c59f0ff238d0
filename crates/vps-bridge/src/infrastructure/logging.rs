//! Logging initialisation.
//!
//! The bridge has one verbosity knob: the `LOG_LEVEL` environment variable,
//! read as a `tracing_subscriber::EnvFilter` directive (`debug`,
//! `vps_bridge=trace,reqwest=warn`, ...).  When it is unset or does not
//! parse, the config file's `log_level` applies, and `info` if that does
//! not parse either.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Picks the filter from `env_value` (the `LOG_LEVEL` value, if set), then
/// `fallback`, then `info`.
pub fn select_filter(env_value: Option<&str>, fallback: &str) -> EnvFilter {
    env_value
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Installs the global `fmt` subscriber.  Call once, from `main`.
///
/// Logs go to stderr so they never mix with transport output on stdout.
pub fn init(fallback: &str) {
    let env_value = std::env::var(LOG_LEVEL_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(select_filter(env_value.as_deref(), fallback))
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_wins_over_fallback() {
        let filter = select_filter(Some("debug"), "warn");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_fallback_used_when_env_unset() {
        let filter = select_filter(None, "vps_bridge=trace");
        assert_eq!(filter.to_string(), "vps_bridge=trace");
    }

    #[test]
    fn test_invalid_values_fall_back_to_info() {
        let filter = select_filter(Some("vps_bridge=loud"), "reqwest=noisy");
        assert_eq!(filter.to_string(), "info");
    }
}
