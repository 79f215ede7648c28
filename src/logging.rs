//! `tracing` subscriber setup for binaries built on cinebot.
//!
//! The library only emits events; nothing is printed until one of these
//! functions installs a subscriber. Events are scoped to the `cinebot`
//! target, so a pipeline run at `Debug` shows each retry attempt and each
//! TMDB lookup without the HTTP stack's own chatter.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that overrides the level passed to [`init_logging`].
pub const LOG_ENV_VAR: &str = "CINEBOT_LOG";

/// Verbosity for cinebot's own events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    /// Adds enrichment misses and truncated model output
    Warn,
    /// One line per pipeline stage
    Info,
    /// Retry attempts, per-title lookups, builder changes
    Debug,
    /// Raw response bodies and model text
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }

    fn directive(self) -> String {
        format!("cinebot={}", self.to_tracing_level())
    }
}

/// Install a stderr subscriber at `level`, unless `CINEBOT_LOG` is set.
///
/// ```no_run
/// use cinebot::logging::{LogLevel, init_logging};
///
/// init_logging(LogLevel::Info);
/// ```
///
/// `CINEBOT_LOG` takes any `EnvFilter` directive list, e.g.
/// `CINEBOT_LOG=cinebot::pipeline=debug`.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));
    install(filter);
    tracing::info!(?level, "cinebot logging ready");
}

/// Install a stderr subscriber from an explicit directive list.
///
/// An unparsable list falls back to `cinebot=info` instead of failing, so a
/// typo in a debug flag never stops the program.
pub fn init_logging_with_filter(filter: &str) {
    install(parse_filter(filter));
    tracing::info!(filter, "cinebot logging ready");
}

fn parse_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter).unwrap_or_else(|e| {
        eprintln!("cinebot: ignoring log filter `{filter}` ({e})");
        EnvFilter::new(LogLevel::Info.directive())
    })
}

fn install(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
