//! Stderr logging for the `qsheet` binary, built on `tracing-subscriber`.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary so embedding callers keep control of their own output.

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Maps `-v` repetitions to a level. Without flags only warnings are shown.
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// A configured filter wins over `RUST_LOG`, which wins over `-v`.
pub fn build_env_filter(verbosity: u8, configured: Option<&str>) -> EnvFilter {
    if let Some(directives) = configured.filter(|raw| !raw.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_for_verbosity(verbosity).as_str().to_lowercase();
        EnvFilter::new(format!("warn,qsheet={level}"))
    })
}

/// Returns `false` when a global subscriber was already installed.
pub fn init_logging(verbosity: u8, configured: Option<&str>) -> bool {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time();
    tracing_subscriber::registry()
        .with(build_env_filter(verbosity, configured))
        .with(layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{build_env_filter, level_for_verbosity};
    use tracing::Level;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for_verbosity(0), Level::WARN);
        assert_eq!(level_for_verbosity(1), Level::INFO);
        assert_eq!(level_for_verbosity(2), Level::DEBUG);
        assert_eq!(level_for_verbosity(9), Level::TRACE);
    }

    #[test]
    fn configured_filter_is_used_verbatim() {
        let filter = build_env_filter(0, Some("qsheet=trace"));
        assert_eq!(filter.to_string(), "qsheet=trace");
    }
}
