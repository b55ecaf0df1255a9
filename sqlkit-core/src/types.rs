//! Value types that cross the FFI boundary.

use sqlkit_db::{Param, QueryResult, Value};

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum SqlParam {
    /// SQL NULL.
    Null,
    /// Bound as integer 1 or 0.
    Bool {
        /// The flag.
        value: bool,
    },
    /// A 64-bit integer.
    Integer {
        /// The integer.
        value: i64,
    },
    /// A double.
    Real {
        /// The float.
        value: f64,
    },
    /// UTF-8 text.
    Text {
        /// The text.
        value: String,
    },
    /// Raw bytes.
    Blob {
        /// The bytes.
        value: Vec<u8>,
    },
}

impl From<SqlParam> for Param {
    fn from(param: SqlParam) -> Self {
        match param {
            SqlParam::Null => Self::Null,
            SqlParam::Bool { value } => Self::Bool(value),
            SqlParam::Integer { value } => Self::Integer(i128::from(value)),
            SqlParam::Real { value } => Self::Real(value),
            SqlParam::Text { value } => Self::Text(value),
            SqlParam::Blob { value } => Self::Blob(value),
        }
    }
}

/// A value read from a result column.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// A 64-bit integer.
    Integer {
        /// The integer.
        value: i64,
    },
    /// A double.
    Real {
        /// The float.
        value: f64,
    },
    /// UTF-8 text.
    Text {
        /// The text.
        value: String,
    },
    /// Raw bytes.
    Blob {
        /// The bytes.
        value: Vec<u8>,
    },
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(value) => Self::Integer { value },
            Value::Real(value) => Self::Real { value },
            Value::Text(value) => Self::Text { value },
            Value::Blob(value) => Self::Blob { value },
        }
    }
}

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum QueryOutput {
    /// The statement produced no rows.
    Empty,
    /// The rows the statement produced. Every row has one value per column.
    Rows {
        /// Column names in result order.
        columns: Vec<String>,
        /// Row values in step order.
        rows: Vec<Vec<SqlValue>>,
    },
}

impl From<QueryResult> for QueryOutput {
    fn from(result: QueryResult) -> Self {
        let rows = result.into_rows();
        let Some(first) = rows.first() else {
            return Self::Empty;
        };
        let columns = first.names().to_vec();
        let rows = rows
            .into_iter()
            .map(|row| row.into_values().into_iter().map(SqlValue::from).collect())
            .collect();
        Self::Rows { columns, rows }
    }
}

/// Open-mode flag for [`Database::open`](crate::Database::open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum OpenFlag {
    /// Open for reading only.
    ReadOnly,
    /// Open for reading and writing.
    ReadWrite,
    /// Create the file if it does not exist.
    Create,
    /// Keep the database in memory.
    Memory,
    /// Multi-thread threading mode.
    NoMutex,
    /// Serialized threading mode.
    FullMutex,
    /// Enable shared cache.
    SharedCache,
    /// Disable shared cache.
    PrivateCache,
    /// Refuse symbolic links.
    NoFollow,
}

impl From<OpenFlag> for sqlkit_db::OpenFlag {
    fn from(flag: OpenFlag) -> Self {
        match flag {
            OpenFlag::ReadOnly => Self::ReadOnly,
            OpenFlag::ReadWrite => Self::ReadWrite,
            OpenFlag::Create => Self::Create,
            OpenFlag::Memory => Self::Memory,
            OpenFlag::NoMutex => Self::NoMutex,
            OpenFlag::FullMutex => Self::FullMutex,
            OpenFlag::SharedCache => Self::SharedCache,
            OpenFlag::PrivateCache => Self::PrivateCache,
            OpenFlag::NoFollow => Self::NoFollow,
        }
    }
}
