//! Multi-statement scripts.

use std::ffi::CStr;

use crate::connection::Connection;
use crate::error::DbResult;
use crate::executor::run_unit;
use crate::row::QueryResult;

impl Connection {
    /// Executes every statement in `sql`, in order, without parameters.
    ///
    /// Statement boundaries are the ones `SQLite` itself finds while
    /// preparing. Each statement contributes one entry; stretches holding
    /// only whitespace or comments contribute none.
    ///
    /// # Errors
    ///
    /// Stops at the first failing statement and returns its error; results
    /// of the statements before it are discarded, but their effects on the
    /// database remain.
    pub fn execute_script(&self, sql: &str) -> DbResult<Vec<QueryResult>> {
        let db = self.handle("execute a script")?;
        let script = self.sql_text(sql)?;
        let bytes = script.as_bytes_with_nul();

        let mut results = Vec::new();
        let mut offset = 0;
        while bytes.get(offset).is_some_and(|b| *b != 0) {
            let Ok(remainder) = CStr::from_bytes_until_nul(&bytes[offset..]) else {
                break;
            };
            let (result, consumed) = run_unit(db, self.path(), remainder, &[])?;
            results.extend(result);
            if consumed == 0 {
                break;
            }
            offset += consumed;
        }

        log::debug!("script ran {} statement(s)", results.len());
        Ok(results)
    }
}
