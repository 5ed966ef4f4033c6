//! Shared logging setup for the export binary.

use crate::Result;

/// Initializes structured logging based on verbosity level.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Errors
/// Returns `Configuration` if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::PulseSurveyError::configuration(format!(
                "Failed to initialize logging: {e}"
            ))
        })?;

    Ok(())
}
