//! The exported database handle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlkit_db::{Connection, OpenFlags, OpenOptions, Param, Params};

use crate::error::SqlError;
use crate::types::{OpenFlag, QueryOutput, SqlParam};

/// A database connection usable from foreign code.
///
/// Every call that reaches `SQLite` runs on tokio's blocking pool, so the
/// caller's executor is never stalled by the engine. Calls on one handle are
/// serialized.
#[derive(uniffi::Object)]
pub struct Database {
    inner: Arc<Mutex<Connection>>,
    path: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Database").field(&self.path).finish()
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl Database {
    /// Opens the database at `path`.
    ///
    /// An empty `flags` list opens read-only. `busy_timeout_ms` makes calls
    /// wait that long for a locked database before failing.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Open`] if the database cannot be opened.
    #[uniffi::constructor]
    pub async fn open(
        path: String,
        flags: Vec<OpenFlag>,
        busy_timeout_ms: Option<u32>,
    ) -> Result<Self, SqlError> {
        let mut options = OpenOptions::new();
        if !flags.is_empty() {
            options = options.flags(
                flags
                    .into_iter()
                    .map(sqlkit_db::OpenFlag::from)
                    .collect::<OpenFlags>(),
            );
        }
        if let Some(ms) = busy_timeout_ms {
            options = options.busy_timeout(Duration::from_millis(u64::from(ms)));
        }

        let target = path.clone();
        let conn = run_blocking(move || {
            Connection::open_with(&target, options).map_err(SqlError::from)
        })
        .await?;
        Ok(Self {
            inner: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Executes the first statement in `sql` with `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared, bound or run.
    pub async fn execute(
        &self,
        sql: String,
        params: Vec<SqlParam>,
    ) -> Result<QueryOutput, SqlError> {
        let params = if params.is_empty() {
            Params::None
        } else {
            Params::Single(params.into_iter().map(Param::from).collect())
        };
        let result = self
            .with_connection(move |conn| conn.execute(&sql, &params))
            .await?;
        Ok(result.into())
    }

    /// Executes `sql` once per parameter set and returns the last result.
    ///
    /// Each run commits on its own.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing run.
    pub async fn execute_many(
        &self,
        sql: String,
        batches: Vec<Vec<SqlParam>>,
    ) -> Result<QueryOutput, SqlError> {
        let params = Params::Batch(
            batches
                .into_iter()
                .map(|set| set.into_iter().map(Param::from).collect())
                .collect(),
        );
        let result = self
            .with_connection(move |conn| conn.execute(&sql, &params))
            .await?;
        Ok(result.into())
    }

    /// Executes every statement in `sql`, returning one output per
    /// statement.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing statement.
    pub async fn execute_script(&self, sql: String) -> Result<Vec<QueryOutput>, SqlError> {
        let results = self
            .with_connection(move |conn| conn.execute_script(&sql))
            .await?;
        Ok(results.into_iter().map(QueryOutput::from).collect())
    }

    /// Whether the database was opened read-only.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidState`] after [`Database::close`].
    pub async fn readonly(&self) -> Result<bool, SqlError> {
        self.with_connection(|conn| conn.readonly()).await
    }

    /// Closes the database. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Engine`] if `SQLite` fails to close the handle.
    /// The handle is released regardless.
    pub async fn close(&self) -> Result<(), SqlError> {
        self.with_connection(Connection::close).await
    }

    /// The path or URI the database was opened with.
    #[must_use]
    pub fn path(&self) -> String {
        self.path.clone()
    }
}

impl Database {
    /// Runs `f` against the connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> Result<T, SqlError>
    where
        F: FnOnce(&mut Connection) -> sqlkit_db::DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || {
            let mut conn = inner.lock().map_err(|_| SqlError::Runtime {
                message: "connection mutex poisoned".to_string(),
            })?;
            f(&mut conn).map_err(SqlError::from)
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, SqlError>
where
    F: FnOnce() -> Result<T, SqlError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SqlError::Runtime {
            message: e.to_string(),
        })?
}
