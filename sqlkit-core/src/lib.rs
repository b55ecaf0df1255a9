//! Foreign-language surface of sqlkit.
//!
//! Exposes [`Database`] and its value types through `UniFFI` for use from
//! Swift, Kotlin and Python. The SQL work itself is done by `sqlkit-db`;
//! this crate moves it off the caller's thread and converts values and
//! errors into FFI-friendly shapes.

mod database;
pub use database::Database;

mod error;
pub use error::SqlError;

mod types;
pub use types::*;

pub mod logger;

uniffi::setup_scaffolding!("sqlkit_core");
