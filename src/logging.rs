//! Diagnostics for the command-line tool.
//!
//! The library only emits `tracing` events; the binary installs this compact
//! stderr subscriber so that results on stdout stay machine-readable.
//!
//! ```no_run
//! use filtrate::logging::{self, LogLevel};
//!
//! logging::init(LogLevel::Debug);
//! tracing::debug!("compiling");
//! ```

use tracing_subscriber::{Layer, Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Installs the global subscriber: `LEVEL message fields`, no timestamps,
/// no module paths, written to stderr.
///
/// Calling it twice is harmless; the second subscriber is ignored.
pub fn init(level: LogLevel) {
    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(LevelFilter::from(level));

    let _ = Registry::default().with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_is_warn() {
        assert_eq!(LevelFilter::from(LogLevel::default()), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::OFF);
    }
}
