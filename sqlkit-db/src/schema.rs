//! Result-set schemas.

use std::sync::Arc;

use crate::error::DbResult;
use crate::statement::Statement;

/// Ordered column names of a result set.
///
/// Built once per statement execution and shared by every [`Row`] that
/// execution produces.
///
/// [`Row`]: crate::Row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    names: Vec<String>,
}

impl RowSchema {
    pub(crate) const fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Column names in result order. Duplicates are kept as declared.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the result set has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of the first column called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Lazily built schema for one statement execution.
#[derive(Debug, Default)]
pub(crate) struct SchemaCache {
    schema: Option<Arc<RowSchema>>,
}

impl SchemaCache {
    /// Returns the schema, reading column names from `stmt` the first time.
    pub(crate) fn get_or_build(&mut self, stmt: &Statement<'_>) -> DbResult<Arc<RowSchema>> {
        if let Some(schema) = &self.schema {
            return Ok(Arc::clone(schema));
        }
        let names = (0..stmt.column_count())
            .map(|idx| stmt.column_name(idx))
            .collect::<DbResult<Vec<_>>>()?;
        let schema = Arc::new(RowSchema::new(names));
        self.schema = Some(Arc::clone(&schema));
        Ok(schema)
    }
}
