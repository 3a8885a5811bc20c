//! Generic logger utility functions
//!
//! The logger is initialised once per execution and hands back a [`LogHandle`]. Components are
//! given a handle (or a child of one) when they are built and log under the handle's target, so
//! the source of every line is explicit rather than tied to a module path.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use std::sync::Arc;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle passed into each component so it can log under its own target.
///
/// Cloning a handle is cheap. Use with the `log` macros:
///
/// ```ignore
/// info!(target: log.target(), "Landing started");
/// ```
#[derive(Debug, Clone)]
pub struct LogHandle {
    target: Arc<str>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LogHandle {
    /// Create a handle which isn't tied to an initialised dispatcher.
    ///
    /// Logging through this handle is a no-op unless some logger has been installed, which makes
    /// it suitable for tests.
    pub fn detached(name: &str) -> Self {
        Self {
            target: Arc::from(name),
        }
    }

    /// Derive a handle for a sub-component, with target `<parent>::<name>`.
    pub fn component(&self, name: &str) -> Self {
        Self {
            target: Arc::from(format!("{}::{}", self.target, name)),
        }
    }

    /// The target to pass to the `log` macros.
    pub fn target(&self) -> &str {
        &self.target
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution, returning the root handle.
///
/// # Notes
///
/// - `min_level` must be greater than `log::Level::Info`.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    session: &session::Session,
    root_target: &str,
) -> Result<LogHandle, LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    // Setup the logger using fern's builder pattern
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}: {}",
                session::get_elapsed_seconds(),
                level_to_str(record.level()),
                record.target(),
                message
            ))
        })
        .level(min_level)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    let handle = LogHandle::detached(root_target);

    info!(target: handle.target(), "Logging initialised");
    info!(target: handle.target(), "    Session epoch: {}", session::get_epoch());
    info!(target: handle.target(), "    Log level: {:?}", min_level);
    info!(target: handle.target(), "    Log file path: {:?}", session.log_file_path);

    Ok(handle)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}
