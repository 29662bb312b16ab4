//! Tracing setup for the `flightabove` binary and tests.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How chatty the log output is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Poll summaries and warnings.
    #[default]
    Normal,
    /// Per-request detail.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map `-v` occurrences and `--quiet` to a verbosity.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// The most detailed level that is emitted.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    fn directive(self) -> String {
        format!("flightabove={}", self.to_level_filter())
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbosity` when it is set. Logs go to stderr so
/// `--json` output on stdout stays clean. Calling this twice is harmless.
///
/// ```no_run
/// use flightabove::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    let _ = subscriber.try_init();
}

/// Warnings and errors only, captured by the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
