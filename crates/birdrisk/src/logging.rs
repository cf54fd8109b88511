//! Diagnostics for the `birdrisk` binary.
//!
//! Everything is written to stderr, so reports on stdout (JSON, CSV) can be
//! piped while dropped dataset rows and degraded lookups are still visible.
//! When `RUST_LOG` is set it replaces the directives derived from the flags.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much diagnostic output to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Dataset load summary and warnings.
    #[default]
    Normal,
    /// Filter and aggregation counts (`-v`).
    Verbose,
    /// Per-year classification and HTTP client activity (`-vv`).
    Trace,
}

impl Verbosity {
    /// Derive the verbosity from `-q` and the number of `-v` flags.
    ///
    /// `-q` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Level applied to this crate's own events.
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::ERROR,
            Self::Normal => LevelFilter::INFO,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    ///
    /// The HTTP client stays at warnings unless tracing is requested.
    #[must_use]
    pub fn directives(self) -> String {
        let http = if self == Self::Trace {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        };
        format!("birdrisk={},reqwest={http}", self.level())
    }
}

/// Install the stderr subscriber.
///
/// Event targets are shown from `-v` upward. Calling this more than once is
/// harmless; only the first call installs a subscriber.
///
/// # Examples
///
/// ```no_run
/// use birdrisk::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= Verbosity::Verbose)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
