//! Forwarding of `log` records to a foreign logger.
//!
//! Foreign code implements [`Logger`] and installs it once with
//! [`set_logger`]. From then on every record emitted by sqlkit is handed to
//! it, as are warnings and errors from dependencies.
//!
//! ```rust
//! use sqlkit_core::logger::{LogLevel, Logger};
//!
//! struct Stderr;
//!
//! impl Logger for Stderr {
//!     fn log(&self, level: LogLevel, message: String) {
//!         eprintln!("[{level:?}] {message}");
//!     }
//! }
//! ```
//!
//! ## Kotlin
//!
//! ```kotlin
//! object SqlKitLog : uniffi.sqlkit.Logger {
//!     override fun log(level: LogLevel, message: String) {
//!         android.util.Log.println(level.priority(), "sqlkit", message)
//!     }
//! }
//!
//! setLogger(SqlKitLog) // once, at startup
//! ```

use std::sync::{Arc, OnceLock};

/// Receives log messages. Implemented on the foreign side.
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Records `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing, such as statement row counts.
    Trace,
    /// Debugging information, such as databases being opened and closed.
    Debug,
    /// Informational messages.
    Info,
    /// Something went wrong but the call could carry on.
    Warn,
    /// A failure.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static FOREIGN_LOGGER: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// `log` backend that hands records to [`FOREIGN_LOGGER`].
struct Bridge;

impl Bridge {
    /// Debug and trace records are only forwarded from sqlkit's own crates.
    fn forwards(record: &log::Record<'_>) -> bool {
        record.level() <= log::Level::Info
            || record
                .module_path()
                .is_some_and(|module| module.starts_with("sqlkit"))
    }
}

impl log::Log for Bridge {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if !Self::forwards(record) {
            return;
        }
        match FOREIGN_LOGGER.get() {
            Some(logger) => logger.log(record.level().into(), record.args().to_string()),
            None => eprintln!("sqlkit logger not set: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

/// Installs `logger` as the destination for sqlkit's log output.
///
/// Only the first call has an effect; later calls are reported on stderr
/// and ignored.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if FOREIGN_LOGGER.set(logger).is_err() {
        eprintln!("sqlkit logger already set");
        return;
    }

    static BRIDGE: Bridge = Bridge;
    match log::set_logger(&BRIDGE) {
        Ok(()) => log::set_max_level(log::LevelFilter::Trace),
        Err(e) => eprintln!("failed to install sqlkit logger: {e}"),
    }
}
