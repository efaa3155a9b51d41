//! Logging configuration for formrelay.
//!
//! Both the front door and the decoder log through `tracing`. The binary
//! installs one `fmt` subscriber at startup.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the front door and decoder log, as picked by `-q`/`-v` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: errors only.
    Quiet,
    /// No flag: startup, saved entries and one line per request.
    #[default]
    Normal,
    /// `-v`: adds socket setup and store writes.
    Verbose,
    /// `-vv`: adds every datagram sent and received.
    Trace,
}

impl Verbosity {
    /// The most detailed level that gets through.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Install the global subscriber.
///
/// The filter covers this crate and `tower_http` request spans at the
/// level `verbosity` selects. A set `RUST_LOG` replaces that filter
/// entirely. Calls after the first are no-ops.
///
/// ```no_run
/// use formrelay::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let level = verbosity.to_level_filter();
    let default_filter = format!("formrelay={level},tower_http={level}");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init();
}
