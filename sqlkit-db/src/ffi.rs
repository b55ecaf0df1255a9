//! Raw SQLite handles.
//!
//! This is the **only** file in the crate that contains `unsafe` code or
//! touches C types. Everything above it works with [`RawDb`] and
//! [`RawStmt`], which own their pointers and release them exactly once.
//!
//! The symbols come from `libsqlite3-sys` built with its bundled
//! amalgamation, so no system SQLite is required.

#![allow(dead_code)]

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};

mod sys {
    pub use libsqlite3_sys::*;

    // `libsqlite3-sys` omits `sqlite3_close_v2` from its generated bindings,
    // but the bundled amalgamation still exports the symbol.
    extern "C" {
        pub fn sqlite3_close_v2(db: *mut sqlite3) -> std::os::raw::c_int;
    }
}

// ── SQLite constants ────────────────────────────────────────────────────

pub const SQLITE_OK: c_int = 0;
pub const SQLITE_ERROR: c_int = 1;
pub const SQLITE_NOMEM: c_int = 7;
pub const SQLITE_CANTOPEN: c_int = 14;
pub const SQLITE_TOOBIG: c_int = 18;
pub const SQLITE_MISUSE: c_int = 21;
pub const SQLITE_ROW: c_int = 100;
pub const SQLITE_DONE: c_int = 101;

// Column storage classes
pub const SQLITE_INTEGER: c_int = 1;
pub const SQLITE_FLOAT: c_int = 2;
pub const SQLITE_TEXT: c_int = 3;
pub const SQLITE_BLOB: c_int = 4;
pub const SQLITE_NULL: c_int = 5;

// Open flags
pub const SQLITE_OPEN_READONLY: c_int = 0x0000_0001;
pub const SQLITE_OPEN_READWRITE: c_int = 0x0000_0002;
pub const SQLITE_OPEN_CREATE: c_int = 0x0000_0004;
pub const SQLITE_OPEN_URI: c_int = 0x0000_0040;
pub const SQLITE_OPEN_MEMORY: c_int = 0x0000_0080;
pub const SQLITE_OPEN_NOMUTEX: c_int = 0x0000_8000;
pub const SQLITE_OPEN_FULLMUTEX: c_int = 0x0001_0000;
pub const SQLITE_OPEN_SHAREDCACHE: c_int = 0x0002_0000;
pub const SQLITE_OPEN_PRIVATECACHE: c_int = 0x0004_0000;
pub const SQLITE_OPEN_NOFOLLOW: c_int = 0x0100_0000;
pub const SQLITE_OPEN_EXRESCODE: c_int = 0x0200_0000;

/// Returns `true` for result codes that do not signal a failure.
pub const fn is_clean(code: c_int) -> bool {
    matches!(code & 0xff, SQLITE_OK | SQLITE_ROW | SQLITE_DONE)
}

/// Returns the engine's English description of a result code.
pub fn errstr(code: c_int) -> String {
    // SAFETY: sqlite3_errstr returns a pointer to a static string (or null).
    unsafe { owned_string(sys::sqlite3_errstr(code)) }
        .unwrap_or_else(|| format!("unknown error ({code})"))
}

/// The error state of a connection, read straight from the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub code: c_int,
    pub extended_code: c_int,
    pub message: String,
}

impl EngineState {
    /// Builds a state from a bare result code when no handle is available.
    pub fn from_code(code: c_int) -> Self {
        Self {
            code: code & 0xff,
            extended_code: code,
            message: errstr(code),
        }
    }
}

/// Copies a NUL-terminated C string into an owned `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a valid NUL-terminated string.
unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

// ── Connection handle ───────────────────────────────────────────────────

/// Owned `sqlite3*` handle.
///
/// Closed by [`RawDb::close`] or, failing that, when dropped.
pub struct RawDb {
    ptr: NonNull<sys::sqlite3>,
}

// SAFETY: the handle is only ever used by one thread at a time; `RawDb` is
// not `Sync`, so shared access across threads is impossible.
unsafe impl Send for RawDb {}

impl RawDb {
    /// Opens a handle with `sqlite3_open_v2`.
    ///
    /// SQLite may hand back a handle even when opening fails (so that the
    /// error can be inspected); it is returned alongside the result code and
    /// the caller is responsible for closing it.
    pub fn open(path: &CStr, flags: c_int) -> (c_int, Option<Self>) {
        let mut db: *mut sys::sqlite3 = ptr::null_mut();
        // SAFETY: `path` is NUL-terminated and `db` is a valid out pointer.
        let rc = unsafe { sys::sqlite3_open_v2(path.as_ptr(), &mut db, flags, ptr::null()) };
        (rc, NonNull::new(db).map(|ptr| Self { ptr }))
    }

    /// Closes the handle.
    ///
    /// The handle is consumed whatever the outcome, so it can never be closed
    /// twice. On failure the error state is captured before the handle is
    /// abandoned.
    pub fn close(self) -> Result<(), EngineState> {
        let this = ManuallyDrop::new(self);
        // SAFETY: the pointer is live and is never used again after this call.
        let rc = unsafe { sys::sqlite3_close_v2(this.ptr.as_ptr()) };
        if rc == SQLITE_OK {
            Ok(())
        } else {
            Err(this.last_error())
        }
    }

    /// Reads the result code, extended result code and message of the most
    /// recent API call on this handle.
    pub fn last_error(&self) -> EngineState {
        let db = self.ptr.as_ptr();
        // SAFETY: `db` is a live handle; errmsg returns a string owned by it
        // that we copy immediately.
        unsafe {
            EngineState {
                // errcode reports the extended code once EXRESCODE is set
                code: sys::sqlite3_errcode(db) & 0xff,
                extended_code: sys::sqlite3_extended_errcode(db),
                message: owned_string(sys::sqlite3_errmsg(db))
                    .unwrap_or_else(|| "unknown error".to_string()),
            }
        }
    }

    /// Primary result code of the most recent API call.
    pub fn errcode(&self) -> c_int {
        // SAFETY: live handle.
        unsafe { sys::sqlite3_errcode(self.ptr.as_ptr()) }
    }

    /// `sqlite3_db_readonly`: 1 read-only, 0 read/write, -1 unknown schema.
    pub fn readonly(&self, schema: &CStr) -> c_int {
        // SAFETY: live handle, NUL-terminated schema name.
        unsafe { sys::sqlite3_db_readonly(self.ptr.as_ptr(), schema.as_ptr()) }
    }

    /// Installs a busy handler that sleeps for up to `ms` milliseconds.
    pub fn busy_timeout(&self, ms: c_int) -> c_int {
        // SAFETY: live handle.
        unsafe { sys::sqlite3_busy_timeout(self.ptr.as_ptr(), ms) }
    }

    /// Rows modified by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> c_int {
        // SAFETY: live handle.
        unsafe { sys::sqlite3_changes(self.ptr.as_ptr()) }
    }

    /// Rowid of the most recent successful INSERT.
    pub fn last_insert_rowid(&self) -> i64 {
        // SAFETY: live handle.
        unsafe { sys::sqlite3_last_insert_rowid(self.ptr.as_ptr()) }
    }

    /// Number of prepared statements that have not been finalized yet.
    pub fn statement_count(&self) -> usize {
        let db = self.ptr.as_ptr();
        let mut count = 0;
        // SAFETY: live handle; sqlite3_next_stmt only walks its own list.
        let mut stmt = unsafe { sys::sqlite3_next_stmt(db, ptr::null_mut()) };
        while !stmt.is_null() {
            count += 1;
            // SAFETY: `stmt` was returned by the previous call.
            stmt = unsafe { sys::sqlite3_next_stmt(db, stmt) };
        }
        count
    }

    /// Compiles the first statement in `sql`.
    ///
    /// Returns the result code, the statement (absent when `sql` holds only
    /// whitespace or comments, or on failure) and the number of bytes of
    /// `sql` that were consumed.
    pub fn prepare(&self, sql: &CStr) -> (c_int, Option<RawStmt<'_>>, usize) {
        let start = sql.as_ptr();
        let mut stmt: *mut sys::sqlite3_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();
        // SAFETY: live handle, NUL-terminated SQL, valid out pointers.
        let rc = unsafe {
            sys::sqlite3_prepare_v2(self.ptr.as_ptr(), start, -1, &mut stmt, &mut tail)
        };
        let consumed = if tail.is_null() {
            sql.to_bytes().len()
        } else {
            // SAFETY: SQLite sets `tail` to a position inside `sql`.
            usize::try_from(unsafe { tail.offset_from(start) })
                .unwrap_or_else(|_| sql.to_bytes().len())
        };
        let stmt = NonNull::new(stmt).map(|ptr| RawStmt {
            ptr,
            _db: PhantomData,
        });
        (rc, stmt, consumed)
    }
}

impl Drop for RawDb {
    fn drop(&mut self) {
        // SAFETY: the pointer is live; `close` bypasses this via ManuallyDrop.
        unsafe {
            sys::sqlite3_close_v2(self.ptr.as_ptr());
        }
    }
}

// ── Statement handle ────────────────────────────────────────────────────

/// Owned `sqlite3_stmt*`, borrowed from the [`RawDb`] that compiled it.
///
/// Finalized by [`RawStmt::finalize`] or, failing that, when dropped.
pub struct RawStmt<'db> {
    ptr: NonNull<sys::sqlite3_stmt>,
    _db: PhantomData<&'db RawDb>,
}

impl RawStmt<'_> {
    /// Number of bind placeholders declared by the statement.
    pub fn parameter_count(&self) -> c_int {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_bind_parameter_count(self.ptr.as_ptr()) }
    }

    pub fn bind_null(&self, idx: c_int) -> c_int {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_bind_null(self.ptr.as_ptr(), idx) }
    }

    pub fn bind_i64(&self, idx: c_int, value: i64) -> c_int {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_bind_int64(self.ptr.as_ptr(), idx, value) }
    }

    pub fn bind_f64(&self, idx: c_int, value: f64) -> c_int {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_bind_double(self.ptr.as_ptr(), idx, value) }
    }

    /// Binds UTF-8 text. SQLite copies the bytes (`SQLITE_TRANSIENT`).
    pub fn bind_text(&self, idx: c_int, value: &str) -> c_int {
        let Ok(len) = c_int::try_from(value.len()) else {
            return SQLITE_TOOBIG;
        };
        // SAFETY: live statement; pointer/length describe `value`, which
        // SQLite copies before returning.
        unsafe {
            sys::sqlite3_bind_text(
                self.ptr.as_ptr(),
                idx,
                value.as_ptr().cast::<c_char>(),
                len,
                sys::SQLITE_TRANSIENT(),
            )
        }
    }

    /// Binds a blob. SQLite copies the bytes (`SQLITE_TRANSIENT`).
    pub fn bind_blob(&self, idx: c_int, value: &[u8]) -> c_int {
        let Ok(len) = c_int::try_from(value.len()) else {
            return SQLITE_TOOBIG;
        };
        // SAFETY: as for `bind_text`.
        unsafe {
            sys::sqlite3_bind_blob(
                self.ptr.as_ptr(),
                idx,
                value.as_ptr().cast(),
                len,
                sys::SQLITE_TRANSIENT(),
            )
        }
    }

    pub fn step(&self) -> c_int {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_step(self.ptr.as_ptr()) }
    }

    pub fn column_count(&self) -> c_int {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_column_count(self.ptr.as_ptr()) }
    }

    /// Declared name of column `idx`; `None` only on allocation failure.
    pub fn column_name(&self, idx: c_int) -> Option<String> {
        // SAFETY: live statement; the name is copied before returning.
        unsafe { owned_string(sys::sqlite3_column_name(self.ptr.as_ptr(), idx)) }
    }

    /// Storage class of column `idx` in the current row.
    pub fn column_type(&self, idx: c_int) -> c_int {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_column_type(self.ptr.as_ptr(), idx) }
    }

    pub fn column_i64(&self, idx: c_int) -> i64 {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_column_int64(self.ptr.as_ptr(), idx) }
    }

    pub fn column_f64(&self, idx: c_int) -> f64 {
        // SAFETY: live statement.
        unsafe { sys::sqlite3_column_double(self.ptr.as_ptr(), idx) }
    }

    /// Text bytes of column `idx`, exactly as long as SQLite reports.
    ///
    /// The slice is only valid until the statement is stepped again, which
    /// the borrow on `self` guarantees.
    pub fn column_text(&self, idx: c_int) -> Option<&[u8]> {
        let stmt = self.ptr.as_ptr();
        // SAFETY: live statement. `_text` is read before `_bytes` as the
        // SQLite docs require; the buffer stays valid until the next step.
        unsafe {
            let data = sys::sqlite3_column_text(stmt, idx);
            if data.is_null() {
                return None;
            }
            let len = usize::try_from(sys::sqlite3_column_bytes(stmt, idx)).unwrap_or(0);
            Some(std::slice::from_raw_parts(data, len))
        }
    }

    /// Blob bytes of column `idx`. `None` for zero-length blobs and on
    /// allocation failure.
    pub fn column_blob(&self, idx: c_int) -> Option<&[u8]> {
        let stmt = self.ptr.as_ptr();
        // SAFETY: as for `column_text`.
        unsafe {
            let data = sys::sqlite3_column_blob(stmt, idx);
            if data.is_null() {
                return None;
            }
            let len = usize::try_from(sys::sqlite3_column_bytes(stmt, idx)).unwrap_or(0);
            Some(std::slice::from_raw_parts(data.cast::<u8>(), len))
        }
    }

    /// Finalizes the statement and returns the result code.
    ///
    /// Consumes the handle, so finalization happens exactly once.
    pub fn finalize(self) -> c_int {
        let this = ManuallyDrop::new(self);
        // SAFETY: the pointer is live and is never used again.
        unsafe { sys::sqlite3_finalize(this.ptr.as_ptr()) }
    }
}

impl Drop for RawStmt<'_> {
    fn drop(&mut self) {
        // SAFETY: the pointer is live; `finalize` bypasses this via
        // ManuallyDrop.
        unsafe {
            sys::sqlite3_finalize(self.ptr.as_ptr());
        }
    }
}

/// Converts Rust text into a C string, reporting the offset of an interior
/// NUL byte on failure.
pub fn c_string(text: &str) -> Result<CString, usize> {
    CString::new(text).map_err(|e| e.nul_position())
}
