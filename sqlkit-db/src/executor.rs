//! Statement executor.
//!
//! One invocation prepares a single statement, binds it, steps it to
//! completion and finalizes it. Finalization happens on every path, and
//! rows collected before a failure are thrown away.

use std::ffi::CStr;

use crate::connection::Connection;
use crate::error::{DbError, DbResult};
use crate::ffi::RawDb;
use crate::row::{QueryResult, Row};
use crate::schema::SchemaCache;
use crate::statement::{Statement, StepResult};
use crate::value::Param;

const NO_PARAMS: &[Param] = &[];

/// Positional parameters for [`Connection::execute`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// Nothing is bound; every placeholder reads as NULL.
    #[default]
    None,
    /// One set of values, bound to placeholders 1..N.
    Single(Vec<Param>),
    /// The statement runs once per inner set; only the last result is kept.
    Batch(Vec<Vec<Param>>),
}

impl Params {
    /// Classifies a dynamic host value.
    ///
    /// A non-empty list made only of lists is a batch, any other list is a
    /// single set of values, and anything else is rejected.
    ///
    /// # Errors
    ///
    /// [`DbError::UnsupportedType`] if `value` is not a list.
    pub fn from_host(value: Param) -> DbResult<Self> {
        match value {
            Param::List(items)
                if !items.is_empty() && items.iter().all(|p| matches!(p, Param::List(_))) =>
            {
                let sets = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Param::List(set) => Some(set),
                        _ => None,
                    })
                    .collect();
                Ok(Self::Batch(sets))
            }
            Param::List(items) => Ok(Self::Single(items)),
            other => Err(DbError::UnsupportedType {
                type_name: other.type_name().to_string(),
            }),
        }
    }

    /// The parameter set of each repetition. Always at least one.
    fn repetitions(&self) -> Vec<&[Param]> {
        match self {
            Self::None => vec![NO_PARAMS],
            Self::Single(set) => vec![set.as_slice()],
            Self::Batch(sets) if sets.is_empty() => vec![NO_PARAMS],
            Self::Batch(sets) => sets.iter().map(Vec::as_slice).collect(),
        }
    }
}

impl From<Vec<Param>> for Params {
    fn from(set: Vec<Param>) -> Self {
        Self::Single(set)
    }
}

impl From<Vec<Vec<Param>>> for Params {
    fn from(sets: Vec<Vec<Param>>) -> Self {
        Self::Batch(sets)
    }
}

impl Connection {
    /// Executes the first statement in `sql`.
    ///
    /// Anything after the first statement is ignored; use
    /// [`Connection::execute_script`] to run several. SQL that holds no
    /// statement at all succeeds with [`QueryResult::Empty`].
    ///
    /// With [`Params::Batch`] the statement is prepared and run once per
    /// parameter set. Each repetition commits on its own, so a failure part
    /// way through leaves the earlier ones in place.
    ///
    /// # Errors
    ///
    /// - [`DbError::InvalidState`] if the connection is closed.
    /// - [`DbError::UnsupportedType`] / [`DbError::Range`] for a parameter
    ///   that cannot be bound.
    /// - [`DbError::Engine`] for any failure reported by `SQLite`.
    pub fn execute(&self, sql: &str, params: &Params) -> DbResult<QueryResult> {
        let db = self.handle("execute")?;
        let sql = self.sql_text(sql)?;
        let mut result = QueryResult::Empty;
        for set in params.repetitions() {
            let (unit, _) = run_unit(db, self.path(), &sql, set)?;
            result = unit.unwrap_or_default();
        }
        Ok(result)
    }
}

/// Runs the first statement of `sql` with `params`.
///
/// Returns `None` if `sql` holds no statement, along with the number of bytes
/// of `sql` the statement spanned.
pub(crate) fn run_unit(
    db: &RawDb,
    path: &str,
    sql: &CStr,
    params: &[Param],
) -> DbResult<(Option<QueryResult>, usize)> {
    let (stmt, consumed) = Statement::prepare(db, path, sql)?;
    let Some(stmt) = stmt else {
        return Ok((None, consumed));
    };

    let (rows, pending) = match stmt.bind_all(params).and_then(|()| drain(&stmt)) {
        Ok(rows) => (rows, None),
        Err(err) => (Vec::new(), Some(err)),
    };

    if let Some(err) = stmt.finalize(pending) {
        return Err(err);
    }
    log::trace!("statement produced {} row(s)", rows.len());
    Ok((Some(QueryResult::from_rows(rows)), consumed))
}

/// Steps `stmt` until it is done, decoding every row.
fn drain(stmt: &Statement<'_>) -> DbResult<Vec<Row>> {
    let mut schema = SchemaCache::default();
    let mut rows = Vec::new();
    loop {
        match stmt.step()? {
            StepResult::Row => rows.push(stmt.read_row(&mut schema)?),
            StepResult::Done => return Ok(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[test]
    fn test_from_host_classifies_lists() {
        let single = Params::from_host(Param::List(params![1, "a"])).expect("single");
        assert_eq!(single, Params::Single(params![1, "a"]));

        let batch = Params::from_host(Param::List(vec![
            Param::List(params![1]),
            Param::List(params![2]),
        ]))
        .expect("batch");
        assert_eq!(batch, Params::Batch(vec![params![1], params![2]]));

        let mixed = Params::from_host(Param::List(vec![Param::List(params![1]), Param::Null]))
            .expect("mixed list binds as one set");
        assert!(matches!(mixed, Params::Single(ref set) if set.len() == 2));

        let empty = Params::from_host(Param::List(Vec::new())).expect("empty");
        assert_eq!(empty, Params::Single(Vec::new()));
    }

    #[test]
    fn test_from_host_rejects_scalars() {
        let err = Params::from_host(Param::Integer(3)).expect_err("not a list");
        assert!(matches!(err, DbError::UnsupportedType { ref type_name } if type_name == "int"));
    }

    #[test]
    fn test_repetitions() {
        assert_eq!(Params::None.repetitions().len(), 1);
        assert_eq!(Params::Batch(Vec::new()).repetitions(), vec![NO_PARAMS]);
        assert_eq!(
            Params::Batch(vec![params![1], params![2], params![3]]).repetitions().len(),
            3
        );
    }
}
