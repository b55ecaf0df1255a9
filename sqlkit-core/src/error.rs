//! Errors reported to foreign callers.

use sqlkit_db::DbError;
use thiserror::Error;

/// Error returned across the FFI boundary.
///
/// Flattened for foreign callers: each variant carries a rendered message
/// that already includes any error chained as the cause.
#[derive(Debug, Clone, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum SqlError {
    /// The database could not be opened.
    #[error("{message}")]
    Open {
        /// Rendered error chain.
        message: String,
    },
    /// `SQLite` reported a failure.
    #[error("{message}")]
    Engine {
        /// Primary result code.
        code: i32,
        /// Extended result code.
        extended_code: i32,
        /// Rendered error chain.
        message: String,
    },
    /// A value has no mapping between host and engine.
    #[error("{message}")]
    UnsupportedType {
        /// Rendered error.
        message: String,
    },
    /// An integer does not fit in 64 bits.
    #[error("{message}")]
    Range {
        /// Rendered error.
        message: String,
    },
    /// The database is closed.
    #[error("{message}")]
    InvalidState {
        /// Rendered error.
        message: String,
    },
    /// A text column is not valid UTF-8.
    #[error("{message}")]
    Utf8 {
        /// Rendered error.
        message: String,
    },
    /// The blocking task running the call failed, or the connection lock
    /// was poisoned by a panic.
    #[error("runtime error: {message}")]
    Runtime {
        /// Error message.
        message: String,
    },
}

impl From<DbError> for SqlError {
    fn from(error: DbError) -> Self {
        let message = render_chain(&error);
        match error {
            DbError::Open { .. } => Self::Open { message },
            DbError::Engine { ref context, .. } => Self::Engine {
                code: context.code,
                extended_code: context.extended_code,
                message,
            },
            DbError::UnsupportedType { .. } => Self::UnsupportedType { message },
            DbError::Range { .. } => Self::Range { message },
            DbError::InvalidState { .. } => Self::InvalidState { message },
            DbError::Utf8 { .. } => Self::Utf8 { message },
        }
    }
}

/// Renders an error followed by every error chained below it.
fn render_chain(error: &DbError) -> String {
    let mut message = error.to_string();
    let mut cause = error.cause();
    while let Some(inner) = cause {
        message.push_str(" (while handling: ");
        message.push_str(&inner.to_string());
        message.push(')');
        cause = inner.cause();
    }
    message
}
