//! Safe wrapper around a `SQLite` database connection.
//!
//! This file contains **no `unsafe` code**. All FFI interaction is delegated to
//! [`ffi::RawDb`] which encapsulates the raw pointers and C type conversions.

use std::ffi::CString;
use std::fmt;
use std::os::raw::c_int;
use std::path::Path;

use crate::error::{self, DbError, DbResult, ErrorContext};
use crate::ffi::{self, RawDb};
use crate::flags::{OpenFlags, OpenOptions};

/// A `SQLite` database connection.
///
/// Holds at most one live engine handle. [`Connection::close`] releases it
/// (and is a no-op once it has); dropping the connection closes it too.
///
/// `Send` but not `Sync`: one thread drives a connection at a time.
pub struct Connection {
    db: Option<RawDb>,
    path: String,
    flags: OpenFlags,
}

impl Connection {
    /// Opens a database at `path` with `flags`.
    ///
    /// `path` may be a filesystem path, `:memory:`, or a `file:` URI.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] if the handle cannot be established.
    pub fn open(path: impl AsRef<Path>, flags: OpenFlags) -> DbResult<Self> {
        Self::open_with(path, OpenOptions::new().flags(flags))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] if `SQLite` cannot allocate the handle.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(":memory:", OpenFlags::READWRITE | OpenFlags::CREATE)
    }

    /// Opens a database at `path` with the given options.
    ///
    /// If `SQLite` returns a handle alongside a failure, it is closed before
    /// the error is reported.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] if the path cannot be handed to `SQLite`, if
    /// the handle cannot be established, or if the busy timeout cannot be
    /// applied.
    pub fn open_with(path: impl AsRef<Path>, options: OpenOptions) -> DbResult<Self> {
        let path = path.as_ref();
        let Some(path) = path.to_str() else {
            let lossy = path.to_string_lossy();
            return Err(bad_path("path is not valid UTF-8", &lossy));
        };
        let c_path = ffi::c_string(path).map_err(|pos| {
            bad_path(&format!("path contains a NUL byte at offset {pos}"), path)
        })?;

        let (rc, db) = RawDb::open(&c_path, options.flags.with_implicit().bits());
        if rc != ffi::SQLITE_OK {
            return Err(open_failure(db, path, rc));
        }
        let Some(db) = db else {
            return Err(DbError::Open {
                context: ErrorContext::from_code(ffi::SQLITE_NOMEM, Some(path)),
                cause: None,
            });
        };

        if let Some(timeout) = options.busy_timeout {
            let ms = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
            let rc = db.busy_timeout(ms);
            if rc != ffi::SQLITE_OK {
                let err = error::raise(&db, Some(path), rc, None).into_open();
                return Err(close_partial(db, path, err));
            }
        }

        log::debug!("opened database {path:?} ({})", options.flags);
        Ok(Self {
            db: Some(db),
            path: path.to_string(),
            flags: options.flags,
        })
    }

    /// Closes the connection.
    ///
    /// Calling this on a connection that is already closed does nothing. The
    /// handle is released even when `SQLite` reports a failure.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Engine`] if `sqlite3_close_v2` fails.
    pub fn close(&mut self) -> DbResult<()> {
        let Some(db) = self.db.take() else {
            return Ok(());
        };
        db.close()
            .map_err(|state| error::close_error(state, Some(&self.path), None))?;
        log::debug!("closed database {:?}", self.path);
        Ok(())
    }

    /// Whether the `main` database of the live handle is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidState`] if the connection is closed.
    pub fn readonly(&self) -> DbResult<bool> {
        let db = self.handle("check read-only state")?;
        Ok(db.readonly(c"main") == 1)
    }

    /// Returns `true` while a handle is live.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// The path or URI the connection was opened with.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The open-mode flags the connection was opened with, without the
    /// implicit ones.
    #[must_use]
    pub const fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// Rows modified by the most recently completed INSERT, UPDATE or DELETE.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidState`] if the connection is closed.
    pub fn changes(&self) -> DbResult<u64> {
        let db = self.handle("count changes")?;
        Ok(u64::try_from(db.changes()).unwrap_or(0))
    }

    /// Rowid of the most recent successful INSERT.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidState`] if the connection is closed.
    pub fn last_insert_rowid(&self) -> DbResult<i64> {
        Ok(self.handle("read the last rowid")?.last_insert_rowid())
    }

    /// Number of prepared statements on this handle that have not been
    /// finalized. Zero whenever no call is in progress.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidState`] if the connection is closed.
    pub fn outstanding_statements(&self) -> DbResult<usize> {
        Ok(self.handle("count statements")?.statement_count())
    }

    /// The live handle, or [`DbError::InvalidState`] naming `operation`.
    pub(crate) fn handle(&self, operation: &'static str) -> DbResult<&RawDb> {
        self.db
            .as_ref()
            .ok_or(DbError::InvalidState { operation })
    }

    /// Converts SQL text for the engine. Interior NUL bytes are rejected
    /// rather than silently truncating the statement.
    pub(crate) fn sql_text(&self, sql: &str) -> DbResult<CString> {
        ffi::c_string(sql).map_err(|pos| DbError::Engine {
            context: ErrorContext::synthetic(
                ffi::SQLITE_ERROR,
                format!("SQL contains a NUL byte at offset {pos}"),
                Some(&self.path),
            ),
            cause: None,
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("failed to close database {:?}: {err}", self.path);
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({:?})", self.path)
    }
}

fn bad_path(message: &str, path: &str) -> DbError {
    DbError::Open {
        context: ErrorContext::synthetic(ffi::SQLITE_CANTOPEN, message, Some(path)),
        cause: None,
    }
}

/// Builds the error for a failed `sqlite3_open_v2` and releases any handle
/// `SQLite` allocated anyway.
fn open_failure(db: Option<RawDb>, path: &str, rc: c_int) -> DbError {
    match db {
        Some(db) => {
            let err = error::raise(&db, Some(path), rc, None).into_open();
            close_partial(db, path, err)
        }
        None => DbError::Open {
            context: ErrorContext::from_code(rc, Some(path)),
            cause: None,
        },
    }
}

/// Closes a handle that never became a connection. If that fails too, the
/// close failure is reported with `err` as its cause.
fn close_partial(db: RawDb, path: &str, err: DbError) -> DbError {
    match db.close() {
        Ok(()) => err,
        Err(state) => error::close_error(state, Some(path), Some(err)).into_open(),
    }
}
