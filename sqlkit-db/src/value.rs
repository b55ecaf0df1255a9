//! Host values going in and column values coming out.

use serde::Serialize;

/// A value decoded from a result column.
///
/// The variant follows the column's storage class in the current row, not
/// its declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// IEEE-754 double.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Binary blob.
    Blob(Vec<u8>),
}

impl Value {
    /// Returns `true` for SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The integer, if this is an INTEGER value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is a REAL value.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// The text, if this is a TEXT value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// The bytes, if this is a BLOB value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(v) => Some(v),
            _ => None,
        }
    }
}

/// A host value to be bound to a statement placeholder.
///
/// This is the dynamic shape of whatever the caller hands over. Only the
/// scalar variants have an engine representation; `List` and `Map` exist so
/// that parameter sequences can be described (and rejected when they show
/// up where a scalar is expected).
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Binds SQL NULL.
    Null,
    /// Binds integer 1 or 0.
    Bool(bool),
    /// Binds a 64-bit integer; wider values are rejected.
    Integer(i128),
    /// Binds a double.
    Real(f64),
    /// Binds UTF-8 text.
    Text(String),
    /// Binds a blob.
    Blob(Vec<u8>),
    /// A sequence of host values.
    List(Vec<Param>),
    /// A keyed collection of host values.
    Map(Vec<(String, Param)>),
}

impl Param {
    /// Name of the host type, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "int",
            Self::Real(_) => "float",
            Self::Text(_) => "str",
            Self::Blob(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

macro_rules! param_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Param {
                fn from(v: $ty) -> Self {
                    Self::Integer(i128::from(v))
                }
            }
        )*
    };
}

param_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<f32> for Param {
    fn from(v: f32) -> Self {
        Self::Real(f64::from(v))
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Param {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<&[u8]> for Param {
    fn from(v: &[u8]) -> Self {
        Self::Blob(v.to_vec())
    }
}

impl From<Vec<Self>> for Param {
    fn from(v: Vec<Self>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Integer(v) => Self::Integer(i128::from(v)),
            Value::Real(v) => Self::Real(v),
            Value::Text(v) => Self::Text(v),
            Value::Blob(v) => Self::Blob(v),
        }
    }
}

/// Convenience macro for building parameter lists.
///
/// Usage: `params![1_i64, blob.as_slice(), "text", None::<i64>]`
#[macro_export]
macro_rules! params {
    ($($val:expr),* $(,)?) => {
        ::std::vec![$($crate::Param::from($val)),*]
    };
}
