//! Result rows and query results.

use std::ops::Index;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::schema::RowSchema;
use crate::value::Value;

/// One result row: a fixed-length tuple of values addressable by position
/// or by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<RowSchema>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(schema: Arc<RowSchema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    /// The schema shared by every row of the same execution.
    #[must_use]
    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    /// Column names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        self.schema.names()
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at position `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Value of the first column called `name`.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).and_then(|idx| self.values.get(idx))
    }

    /// `(name, value)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Consumes the row, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        &self.values[idx]
    }
}

/// Serialized as a map from column name to value, in column order.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.columns() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of executing one statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// The statement produced no rows.
    #[default]
    Empty,
    /// Every row the statement produced, in step order. Never empty.
    Rows(Vec<Row>),
}

impl QueryResult {
    /// `Empty` for no rows, `Rows` otherwise.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        if rows.is_empty() {
            Self::Empty
        } else {
            Self::Rows(rows)
        }
    }

    /// Returns `true` if no rows were produced.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The rows, or an empty slice.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Empty => &[],
            Self::Rows(rows) => rows,
        }
    }

    /// Consumes the result, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Empty => Vec::new(),
            Self::Rows(rows) => rows,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows().len()
    }
}
