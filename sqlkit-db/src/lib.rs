//! Safe `SQLite` execution layer.
//!
//! This crate runs SQL text against a file- or memory-backed database,
//! binds positional parameters, and decodes each result row into a
//! [`Row`] whose field names are the query's own column names.
//!
//! The engine is the `SQLite` amalgamation bundled by `libsqlite3-sys`.
//! The `ffi` module is the **only** file that contains `unsafe` code or C
//! types; everything else works with the safe types defined here.
//!
//! ```no_run
//! use sqlkit_db::{params, Connection, OpenFlags, Params};
//!
//! # fn main() -> sqlkit_db::DbResult<()> {
//! let conn = Connection::open("app.db", OpenFlags::READWRITE | OpenFlags::CREATE)?;
//! conn.execute_script("CREATE TABLE IF NOT EXISTS t (id INTEGER, name TEXT);")?;
//! conn.execute(
//!     "INSERT INTO t VALUES (?, ?)",
//!     &Params::Single(params![1, "one"]),
//! )?;
//! for row in conn.execute("SELECT id, name FROM t", &Params::None)?.rows() {
//!     println!("{:?} {:?}", row.get_by_name("id"), row.get_by_name("name"));
//! }
//! # Ok(())
//! # }
//! ```

mod ffi;

mod codec;
mod connection;
pub mod error;
mod executor;
mod flags;
mod row;
mod schema;
mod script;
mod statement;
pub mod value;

pub use connection::Connection;
pub use error::{DbError, DbResult, ErrorContext};
pub use executor::Params;
pub use flags::{OpenFlag, OpenFlags, OpenOptions};
pub use row::{QueryResult, Row};
pub use schema::RowSchema;
pub use value::{Param, Value};

#[cfg(test)]
mod tests;
