//! Value codec.
//!
//! Inbound, a [`Param`] is classified by its exact variant and turned into a
//! [`Bound`] value the statement can hand to `sqlite3_bind_*`. Outbound, a
//! column is read according to its storage class in the current row.

use crate::error::{DbError, DbResult};
use crate::ffi;
use crate::statement::{column_index, Statement};
use crate::value::{Param, Value};

/// A parameter ready to be bound. Text and blobs borrow from the [`Param`];
/// the engine copies them during the bind call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Bound<'a> {
    Null,
    Integer(i64),
    Real(f64),
    Text(&'a str),
    Blob(&'a [u8]),
}

/// Converts a host value into something the engine can bind.
///
/// Booleans become 0/1, integers must fit in 64 bits, and compound values
/// have no engine representation at all.
pub(crate) fn encode(param: &Param) -> DbResult<Bound<'_>> {
    match param {
        Param::Null => Ok(Bound::Null),
        Param::Bool(v) => Ok(Bound::Integer(i64::from(*v))),
        Param::Integer(v) => i64::try_from(*v)
            .map(Bound::Integer)
            .map_err(|_| DbError::Range { value: *v }),
        Param::Real(v) => Ok(Bound::Real(*v)),
        Param::Text(v) => Ok(Bound::Text(v)),
        Param::Blob(v) => Ok(Bound::Blob(v)),
        Param::List(_) | Param::Map(_) => Err(DbError::UnsupportedType {
            type_name: param.type_name().to_string(),
        }),
    }
}

/// Decodes column `column` of the statement's current row.
pub(crate) fn decode(stmt: &Statement<'_>, column: usize) -> DbResult<Value> {
    let raw = stmt.raw();
    let idx = column_index(column);
    match raw.column_type(idx) {
        ffi::SQLITE_INTEGER => {
            let value = raw.column_i64(idx);
            checked(stmt, Value::Integer(value))
        }
        ffi::SQLITE_FLOAT => {
            let value = raw.column_f64(idx);
            checked(stmt, Value::Real(value))
        }
        ffi::SQLITE_TEXT => match raw.column_text(idx) {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Value::Text)
                .map_err(|_| DbError::Utf8 { column }),
            None => checked(stmt, Value::Text(String::new())),
        },
        ffi::SQLITE_BLOB => match raw.column_blob(idx) {
            Some(bytes) => Ok(Value::Blob(bytes.to_vec())),
            // zero-length blobs come back as a null pointer
            None => checked(stmt, Value::Blob(Vec::new())),
        },
        ffi::SQLITE_NULL => Ok(Value::Null),
        other => Err(DbError::UnsupportedType {
            type_name: format!("sqlite storage class {other}"),
        }),
    }
}

/// Accepts `value` only if reading it left the engine without an error.
fn checked(stmt: &Statement<'_>, value: Value) -> DbResult<Value> {
    stmt.engine_failure().map_or(Ok(value), Err)
}
