//! Safe wrapper around a `SQLite` prepared statement.
//!
//! This file contains **no `unsafe` code**. All FFI interaction is delegated to
//! [`ffi::RawStmt`] which encapsulates the raw pointers and C type conversions.

use std::ffi::CStr;
use std::os::raw::c_int;

use crate::codec::{self, Bound};
use crate::error::{self, DbError, DbResult};
use crate::ffi::{self, RawDb, RawStmt};
use crate::row::Row;
use crate::schema::SchemaCache;
use crate::value::Param;

/// Result of a single `sqlite3_step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepResult {
    /// A result row is available.
    Row,
    /// The statement has finished executing.
    Done,
}

/// Converts a zero-based column or parameter position to the C index type.
pub(crate) fn column_index(idx: usize) -> c_int {
    c_int::try_from(idx).unwrap_or(c_int::MAX)
}

/// A prepared statement, owned by one executor invocation.
///
/// Finalized exactly once: by [`Statement::finalize`] on every normal path,
/// or by the drop of the underlying handle while unwinding.
pub(crate) struct Statement<'conn> {
    raw: RawStmt<'conn>,
    db: &'conn RawDb,
    path: &'conn str,
}

impl<'conn> Statement<'conn> {
    /// Compiles the first statement of `sql`.
    ///
    /// Returns `None` when `sql` holds no statement (empty, whitespace or
    /// comments only), together with the number of bytes consumed.
    pub(crate) fn prepare(
        db: &'conn RawDb,
        path: &'conn str,
        sql: &CStr,
    ) -> DbResult<(Option<Self>, usize)> {
        let (rc, raw, consumed) = db.prepare(sql);
        if rc != ffi::SQLITE_OK {
            return Err(error::raise(db, Some(path), rc, None));
        }
        log::trace!("prepared {consumed} byte(s) of SQL");
        Ok((raw.map(|raw| Self { raw, db, path }), consumed))
    }

    pub(crate) const fn raw(&self) -> &RawStmt<'conn> {
        &self.raw
    }

    /// Number of placeholders declared by the statement.
    pub(crate) fn parameter_count(&self) -> usize {
        usize::try_from(self.raw.parameter_count()).unwrap_or(0)
    }

    // ── Binding ─────────────────────────────────────────────────────────

    /// Binds `params` to placeholders 1..N in order.
    ///
    /// Values beyond the declared placeholder count are ignored; missing
    /// ones leave their placeholder NULL. Stops at the first value that
    /// cannot be bound.
    pub(crate) fn bind_all(&self, params: &[Param]) -> DbResult<()> {
        for (i, param) in params.iter().take(self.parameter_count()).enumerate() {
            self.bind(column_index(i + 1), param)?;
        }
        Ok(())
    }

    fn bind(&self, idx: c_int, param: &Param) -> DbResult<()> {
        let rc = match codec::encode(param)? {
            Bound::Null => self.raw.bind_null(idx),
            Bound::Integer(v) => self.raw.bind_i64(idx, v),
            Bound::Real(v) => self.raw.bind_f64(idx, v),
            Bound::Text(v) => self.raw.bind_text(idx, v),
            Bound::Blob(v) => self.raw.bind_blob(idx, v),
        };
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            Err(self.error(rc, None))
        }
    }

    // ── Stepping ────────────────────────────────────────────────────────

    /// Executes a single step.
    pub(crate) fn step(&self) -> DbResult<StepResult> {
        match self.raw.step() {
            ffi::SQLITE_ROW => Ok(StepResult::Row),
            ffi::SQLITE_DONE => Ok(StepResult::Done),
            rc => Err(self.error(rc, None)),
        }
    }

    // ── Column reading ──────────────────────────────────────────────────

    /// Returns the number of columns in the result set.
    pub(crate) fn column_count(&self) -> usize {
        usize::try_from(self.raw.column_count()).unwrap_or(0)
    }

    /// Returns the declared name of column `idx`.
    pub(crate) fn column_name(&self, idx: usize) -> DbResult<String> {
        self.raw
            .column_name(column_index(idx))
            .ok_or_else(|| self.error(ffi::SQLITE_NOMEM, None))
    }

    /// Decodes the current row, building the schema on the first call.
    pub(crate) fn read_row(&self, schema: &mut SchemaCache) -> DbResult<Row> {
        let schema = schema.get_or_build(self)?;
        let values = (0..schema.len())
            .map(|column| codec::decode(self, column))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Row::new(schema, values))
    }

    // ── Finalization ────────────────────────────────────────────────────

    /// Finalizes the statement and settles the outcome of the invocation.
    ///
    /// `pending` is the error (if any) that stopped binding or stepping.
    /// A finalize failure is raised with `pending` chained as its cause,
    /// except when `pending` is itself an engine error: `sqlite3_finalize`
    /// then merely repeats the code of the failed step.
    pub(crate) fn finalize(self, pending: Option<DbError>) -> Option<DbError> {
        let Self { raw, db, path } = self;
        let rc = raw.finalize();
        if rc == ffi::SQLITE_OK {
            return pending;
        }
        match pending {
            Some(err @ DbError::Engine { .. }) => Some(err),
            other => Some(error::raise(db, Some(path), rc, other)),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// The engine's current error, if the handle reports one.
    pub(crate) fn engine_failure(&self) -> Option<DbError> {
        let rc = self.db.errcode();
        (!ffi::is_clean(rc)).then(|| self.error(rc, None))
    }

    fn error(&self, rc: c_int, pending: Option<DbError>) -> DbError {
        error::raise(self.db, Some(self.path), rc, pending)
    }
}
