//! Error types and translation of engine failures.
//!
//! Engine failures are translated where they are detected: the result code,
//! extended result code and message are read from the live handle and
//! frozen into an [`ErrorContext`]. An error that was already being
//! propagated at that moment is kept as the new error's `cause`, so neither
//! is lost.

use std::fmt;

use thiserror::Error;

use crate::ffi::{self, EngineState, RawDb};

/// Engine diagnostics captured at the point a failure was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Primary `SQLite` result code.
    pub code: i32,
    /// Extended `SQLite` result code.
    pub extended_code: i32,
    /// Message text (from `sqlite3_errmsg` when a handle was available).
    pub message: String,
    /// Path or URI of the database the failure relates to.
    pub path: Option<String>,
}

impl ErrorContext {
    fn from_state(state: EngineState, path: Option<&str>) -> Self {
        Self {
            code: state.code,
            extended_code: state.extended_code,
            message: state.message,
            path: path.map(str::to_owned),
        }
    }

    /// Builds a context for a failure detected before the engine was asked.
    pub(crate) fn synthetic(code: i32, message: impl Into<String>, path: Option<&str>) -> Self {
        Self {
            code,
            extended_code: code,
            message: message.into(),
            path: path.map(str::to_owned),
        }
    }

    /// Builds a context from a bare result code using the engine's
    /// description of it.
    pub(crate) fn from_code(code: i32, path: Option<&str>) -> Self {
        Self::from_state(EngineState::from_code(code), path)
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.extended_code, self.message)?;
        if let Some(path) = &self.path {
            write!(f, ": {path:?}")?;
        }
        Ok(())
    }
}

/// Error returned by database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The connection could not be established.
    #[error("unable to open database {context}")]
    Open {
        /// Engine diagnostics.
        context: ErrorContext,
        /// Error that was already in flight when this one was raised.
        #[source]
        cause: Option<Box<DbError>>,
    },

    /// `SQLite` reported a failure while preparing, binding, stepping,
    /// finalizing or closing. Malformed script units surface here too.
    #[error("{context}")]
    Engine {
        /// Engine diagnostics.
        context: ErrorContext,
        /// Error that was already in flight when this one was raised.
        #[source]
        cause: Option<Box<DbError>>,
    },

    /// A host value or column storage class has no mapping.
    #[error("unsupported type: '{type_name}'")]
    UnsupportedType {
        /// Name of the offending type.
        type_name: String,
    },

    /// An integer does not fit in the engine's 64-bit integer.
    #[error("integer {value} does not fit in a 64-bit signed integer")]
    Range {
        /// The value that was rejected.
        value: i128,
    },

    /// The operation needs a live connection and there is none.
    #[error("cannot {operation}: the database is closed")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// A TEXT column holds bytes that are not valid UTF-8.
    #[error("column {column} holds text that is not valid UTF-8")]
    Utf8 {
        /// Zero-based column index.
        column: usize,
    },
}

impl DbError {
    /// Engine diagnostics, for [`DbError::Open`] and [`DbError::Engine`].
    #[must_use]
    pub const fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Open { context, .. } | Self::Engine { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Primary result code, when the error came from the engine.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.context().map(|c| c.code)
    }

    /// Extended result code, when the error came from the engine.
    #[must_use]
    pub fn extended_code(&self) -> Option<i32> {
        self.context().map(|c| c.extended_code)
    }

    /// The error that was in flight when this one was raised.
    #[must_use]
    pub fn cause(&self) -> Option<&Self> {
        match self {
            Self::Open { cause, .. } | Self::Engine { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    /// Re-labels an engine error as a failure to open.
    pub(crate) fn into_open(self) -> Self {
        match self {
            Self::Engine { context, cause } => Self::Open { context, cause },
            other => other,
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Translates the engine's current error state into a [`DbError::Engine`].
///
/// `rc` is the code returned by the failing call; it is only used when the
/// handle itself reports no error (failures detected on our side of the
/// boundary, such as oversized text). `pending` is chained as the cause.
pub(crate) fn raise(
    db: &RawDb,
    path: Option<&str>,
    rc: i32,
    pending: Option<DbError>,
) -> DbError {
    debug_assert!(!ffi::is_clean(rc), "raise called for a clean result code {rc}");
    let state = db.last_error();
    let context = if ffi::is_clean(state.code) {
        ErrorContext::from_code(rc, path)
    } else {
        ErrorContext::from_state(state, path)
    };
    DbError::Engine {
        context,
        cause: pending.map(Box::new),
    }
}

/// Translates a failed close into a [`DbError::Engine`].
///
/// The handle is gone by the time this runs, so the state must have been
/// captured by [`RawDb::close`] itself.
pub(crate) fn close_error(
    state: EngineState,
    path: Option<&str>,
    pending: Option<DbError>,
) -> DbError {
    DbError::Engine {
        context: ErrorContext::from_state(state, path),
        cause: pending.map(Box::new),
    }
}
