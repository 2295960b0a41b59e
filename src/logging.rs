//! Logging setup
//!
//! One `tracing-subscriber` formatter shared by the CLI and the native
//! library entry point.

use tracing_subscriber::EnvFilter;

/// Filter from the given environment variable, or `default_directive` when
/// it is unset or unparsable
pub fn filter_from_env(var: &str, default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Level directive for a `-v` count, or `error` in quiet mode
pub fn level_for_verbosity(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber; returns false if one is already set
pub fn init(filter: EnvFilter, json: bool) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.is_ok()
}
