//! Structured logging setup.
//!
//! The controller logs through `tracing` macros; nothing is printed until a
//! subscriber is installed.  Embedding applications that already install their
//! own subscriber should skip [`init_tracing`].

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Error type for subscriber installation.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log level {level:?}: {reason}")]
    InvalidLevel { level: String, reason: String },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Builds the filter: `RUST_LOG` wins over `level`.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidLevel`] if `RUST_LOG` is unset and `level`
/// does not parse.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
            level: level.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Installs a global `fmt` subscriber filtered at `level`.
///
/// # Errors
///
/// Returns [`LoggingError`] if the level is invalid or a subscriber is already
/// installed.
pub fn init_tracing(level: &str) -> Result<(), LoggingError> {
    let filter = build_filter(level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_plain_level() {
        assert!(build_filter("debug").is_ok());
    }

    #[test]
    fn test_build_filter_accepts_per_target_directive() {
        assert!(build_filter("overlay_ctrl=trace,warn").is_ok());
    }

    #[test]
    fn test_init_tracing_twice_reports_install_error() {
        // The first call may succeed or not depending on test order; the
        // second can never succeed in the same process.
        let _ = init_tracing("info");
        let second = init_tracing("info");

        assert!(matches!(second, Err(LoggingError::Install(_))));
    }
}
