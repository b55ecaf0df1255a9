//! Unit tests for the safe `SQLite` execution layer.

use super::*;
use crate::error::raise;
use crate::ffi;
use crate::params;

fn memory_with_table(ddl: &str) -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_script(ddl).expect("create schema");
    conn
}

fn single(params: Vec<Param>) -> Params {
    Params::Single(params)
}

#[test]
fn test_open_in_memory() {
    let conn = memory_with_table("CREATE TABLE t (id INTEGER PRIMARY KEY, val TEXT);");
    conn.execute("INSERT INTO t (id, val) VALUES (?, ?)", &single(params![1, "hello"]))
        .expect("insert");
    let result = conn
        .execute("SELECT val FROM t WHERE id = ?", &single(params![1]))
        .expect("query");
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows()[0].get_by_name("val"), Some(&Value::Text("hello".into())));
    assert_eq!(conn.outstanding_statements().expect("count"), 0);
}

#[test]
fn test_storage_class_decides_value_variant() {
    let conn = memory_with_table("CREATE TABLE t (x);");
    conn.execute_script(
        "INSERT INTO t VALUES (1); INSERT INTO t VALUES (1.5); INSERT INTO t VALUES ('a');
         INSERT INTO t VALUES (x'00ff'); INSERT INTO t VALUES (NULL);",
    )
    .expect("insert");
    let values: Vec<Value> = conn
        .execute("SELECT x FROM t ORDER BY rowid", &Params::None)
        .expect("select")
        .into_rows()
        .into_iter()
        .flat_map(Row::into_values)
        .collect();
    assert_eq!(
        values,
        vec![
            Value::Integer(1),
            Value::Real(1.5),
            Value::Text("a".into()),
            Value::Blob(vec![0x00, 0xff]),
            Value::Null,
        ]
    );
}

#[test]
fn test_empty_text_and_blob_are_not_null() {
    let conn = Connection::open_in_memory().expect("open");
    let result = conn
        .execute("SELECT ?, ?", &single(params!["", Vec::<u8>::new()]))
        .expect("select");
    let row = &result.rows()[0];
    assert_eq!(row[0], Value::Text(String::new()));
    assert_eq!(row[1], Value::Blob(Vec::new()));
}

#[test]
fn test_bool_binds_as_integer() {
    let conn = Connection::open_in_memory().expect("open");
    let result = conn
        .execute("SELECT ?, ?", &single(params![true, false]))
        .expect("select");
    assert_eq!(result.rows()[0].values(), [Value::Integer(1), Value::Integer(0)]);
}

#[test]
fn test_excess_params_ignored_and_missing_params_null() {
    let conn = Connection::open_in_memory().expect("open");
    let result = conn
        .execute("SELECT ?", &single(params![1, 2, 3]))
        .expect("excess values are not bound");
    assert_eq!(result.rows()[0][0], Value::Integer(1));

    let result = conn
        .execute("SELECT ?, ?", &single(params![7]))
        .expect("missing values read as NULL");
    assert_eq!(result.rows()[0].values(), [Value::Integer(7), Value::Null]);
}

#[test]
fn test_params_not_bound_without_placeholders() {
    let conn = Connection::open_in_memory().expect("open");
    let list = Param::List(params![1]);
    let result = conn
        .execute("SELECT 1 AS one", &single(vec![list]))
        .expect("no placeholder, nothing to classify");
    assert_eq!(result.rows()[0].names(), ["one"]);
}

#[test]
fn test_unsupported_param_finalizes_statement() {
    let conn = Connection::open_in_memory().expect("open");
    let err = conn
        .execute("SELECT ?, ?", &single(vec![Param::Integer(1), Param::Map(Vec::new())]))
        .expect_err("maps cannot be bound");
    assert!(matches!(err, DbError::UnsupportedType { ref type_name } if type_name == "map"));
    assert_eq!(conn.outstanding_statements().expect("count"), 0);
}

#[test]
fn test_integer_out_of_range() {
    let conn = Connection::open_in_memory().expect("open");
    let err = conn
        .execute("SELECT ?", &single(params![u64::MAX]))
        .expect_err("u64::MAX does not fit");
    assert!(matches!(err, DbError::Range { value } if value == i128::from(u64::MAX)));
    assert_eq!(conn.outstanding_statements().expect("count"), 0);
}

#[test]
fn test_invalid_utf8_text_column() {
    let conn = Connection::open_in_memory().expect("open");
    let err = conn
        .execute("SELECT 1, CAST(x'ff' AS TEXT)", &Params::None)
        .expect_err("0xff is not UTF-8");
    assert!(matches!(err, DbError::Utf8 { column: 1 }));
    assert_eq!(conn.outstanding_statements().expect("count"), 0);
}

#[test]
fn test_column_names_preserved_verbatim() {
    let conn = Connection::open_in_memory().expect("open");
    let result = conn
        .execute(r#"SELECT 1 AS x, 2 AS x, 3 AS "", 4 AS "a b""#, &Params::None)
        .expect("select");
    let row = &result.rows()[0];
    assert_eq!(row.names(), ["x", "x", "", "a b"]);
    assert_eq!(row.get_by_name("x"), Some(&Value::Integer(1)));
    assert_eq!(row.get_by_name("a b"), Some(&Value::Integer(4)));
}

#[test]
fn test_rows_share_one_schema() {
    let conn = memory_with_table("CREATE TABLE t (a, b);");
    conn.execute(
        "INSERT INTO t VALUES (?, ?)",
        &Params::Batch(vec![params![1, 2], params![3, 4], params![5, 6]]),
    )
    .expect("insert");
    let rows = conn
        .execute("SELECT a, b FROM t", &Params::None)
        .expect("select")
        .into_rows();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert!(std::sync::Arc::ptr_eq(row.schema(), rows[0].schema()));
    }
}

#[test]
fn test_empty_sql_is_empty_result() {
    let conn = Connection::open_in_memory().expect("open");
    for sql in ["", "   \n\t", "-- nothing here", "/* still nothing */"] {
        let result = conn.execute(sql, &Params::None).expect("no statement");
        assert!(result.is_empty(), "{sql:?}");
    }
}

#[test]
fn test_execute_runs_first_statement_only() {
    let conn = Connection::open_in_memory().expect("open");
    let result = conn.execute("SELECT 1; SELECT 2", &Params::None).expect("select");
    assert_eq!(result.rows()[0][0], Value::Integer(1));
}

#[test]
fn test_syntax_error_is_engine_error() {
    let conn = Connection::open_in_memory().expect("open");
    let err = conn.execute("SELEC 1", &Params::None).expect_err("bad SQL");
    assert_eq!(err.code(), Some(1));
    let context = err.context().expect("engine context");
    assert!(context.message.contains("syntax error"), "{}", context.message);
    assert_eq!(context.path.as_deref(), Some(":memory:"));
    assert!(err.to_string().starts_with("[1] "), "{err}");
    assert!(err.cause().is_none());
}

#[test]
fn test_step_failure_reports_extended_code_once() {
    let conn = memory_with_table("CREATE TABLE t (id INTEGER PRIMARY KEY);");
    conn.execute("INSERT INTO t VALUES (1)", &Params::None).expect("first insert");
    let err = conn
        .execute("INSERT INTO t VALUES (1)", &Params::None)
        .expect_err("duplicate key");
    // SQLITE_CONSTRAINT / SQLITE_CONSTRAINT_PRIMARYKEY
    assert_eq!(err.code(), Some(19));
    assert_eq!(err.extended_code(), Some(1555));
    assert!(err.cause().is_none(), "finalize must not re-raise the step failure");
    assert_eq!(conn.outstanding_statements().expect("count"), 0);
}

#[test]
fn test_nul_in_sql_is_rejected() {
    let conn = Connection::open_in_memory().expect("open");
    let err = conn
        .execute("SELECT 1\0; DROP TABLE t", &Params::None)
        .expect_err("interior NUL");
    assert!(matches!(err, DbError::Engine { .. }));
    assert_eq!(err.code(), Some(ffi::SQLITE_ERROR));
}

#[test]
fn test_raise_chains_pending_error() {
    let conn = Connection::open_in_memory().expect("open");
    let db = conn.handle("test").expect("live handle");
    let (rc, stmt, _) = db.prepare(c"SELEC 1");
    assert!(stmt.is_none());

    let err = raise(db, Some("x.db"), rc, Some(DbError::Range { value: 1 << 70 }));
    assert_eq!(err.code(), Some(1));
    assert!(matches!(err.cause(), Some(DbError::Range { .. })));
    let source = std::error::Error::source(&err).expect("cause exposed as source");
    assert!(source.to_string().contains("64-bit"));
}

#[test]
fn test_raise_falls_back_to_result_code() {
    let conn = Connection::open_in_memory().expect("open");
    let db = conn.handle("test").expect("live handle");
    let err = raise(db, None, ffi::SQLITE_TOOBIG, None);
    assert_eq!(err.code(), Some(ffi::SQLITE_TOOBIG));
    assert_eq!(err.context().expect("context").message, ffi::errstr(ffi::SQLITE_TOOBIG));
}

#[test]
fn test_close_is_idempotent_and_blocks_further_use() {
    let mut conn = Connection::open_in_memory().expect("open");
    assert!(conn.is_open());
    conn.close().expect("close");
    assert!(!conn.is_open());
    conn.close().expect("second close is a no-op");

    let err = conn.execute("SELECT 1", &Params::None).expect_err("closed");
    assert!(matches!(err, DbError::InvalidState { operation: "execute" }));
    assert!(matches!(conn.readonly(), Err(DbError::InvalidState { .. })));
    assert!(matches!(conn.execute_script("SELECT 1"), Err(DbError::InvalidState { .. })));
    assert!(matches!(conn.outstanding_statements(), Err(DbError::InvalidState { .. })));
}

#[test]
fn test_connection_accessors() {
    let conn = memory_with_table("CREATE TABLE t (x);");
    assert_eq!(format!("{conn:?}"), r#"Connection(":memory:")"#);
    assert_eq!(conn.path(), ":memory:");
    assert_eq!(conn.flags(), OpenFlags::READWRITE | OpenFlags::CREATE);
    assert!(!conn.readonly().expect("readonly"));

    conn.execute("INSERT INTO t VALUES (?)", &Params::Batch(vec![params![1], params![2]]))
        .expect("insert");
    assert_eq!(conn.last_insert_rowid().expect("rowid"), 2);
    conn.execute("UPDATE t SET x = x + 1", &Params::None).expect("update");
    assert_eq!(conn.changes().expect("changes"), 2);
}

#[test]
fn test_open_rejects_nul_in_path() {
    let err = Connection::open("bad\0name.db", OpenFlags::READONLY).expect_err("interior NUL");
    assert!(matches!(err, DbError::Open { .. }));
    assert_eq!(err.code(), Some(ffi::SQLITE_CANTOPEN));
}

#[test]
fn test_open_uri() {
    let conn = Connection::open(
        "file:uri-test?mode=memory",
        OpenFlags::READWRITE | OpenFlags::CREATE,
    )
    .expect("URI filenames are always enabled");
    let result = conn.execute("SELECT 42", &Params::None).expect("select");
    assert_eq!(result.rows()[0][0], Value::Integer(42));
}

#[test]
fn test_batch_returns_last_result() {
    let conn = memory_with_table("CREATE TABLE t (x INTEGER);");
    let result = conn
        .execute(
            "INSERT INTO t VALUES (?) RETURNING x * 10 AS tenfold",
            &Params::Batch(vec![params![1], params![2], params![3]]),
        )
        .expect("batch insert");
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows()[0].get_by_name("tenfold"), Some(&Value::Integer(30)));

    let count = conn.execute("SELECT count(*) FROM t", &Params::None).expect("count");
    assert_eq!(count.rows()[0][0], Value::Integer(3));
}

#[test]
fn test_empty_batch_runs_once_unbound() {
    let conn = Connection::open_in_memory().expect("open");
    let result = conn
        .execute("SELECT ? IS NULL", &Params::Batch(Vec::new()))
        .expect("select");
    assert_eq!(result.rows()[0][0], Value::Integer(1));
}

#[test]
fn test_batch_failure_keeps_earlier_repetitions() {
    let conn = memory_with_table("CREATE TABLE t (id INTEGER PRIMARY KEY);");
    let err = conn
        .execute(
            "INSERT INTO t VALUES (?)",
            &Params::Batch(vec![params![1], params![2], params![2], params![3]]),
        )
        .expect_err("duplicate in batch");
    assert_eq!(err.code(), Some(19));
    let ids = conn.execute("SELECT id FROM t ORDER BY id", &Params::None).expect("select");
    let ids: Vec<_> = ids.rows().iter().map(|r| r[0].clone()).collect();
    assert_eq!(ids, vec![Value::Integer(1), Value::Integer(2)]);
}

#[test]
fn test_script_results_per_statement() {
    let conn = Connection::open_in_memory().expect("open");
    let results = conn
        .execute_script(
            "CREATE TABLE t (x);
             -- a comment between statements
             INSERT INTO t VALUES (1), (2);
             SELECT x FROM t ORDER BY x;
             /* trailing comment */  ",
        )
        .expect("script");
    assert_eq!(results.len(), 3);
    assert!(results[0].is_empty());
    assert!(results[1].is_empty());
    assert_eq!(results[2].len(), 2);
    assert_eq!(conn.outstanding_statements().expect("count"), 0);
}

#[test]
fn test_script_of_nothing() {
    let conn = Connection::open_in_memory().expect("open");
    assert!(conn.execute_script("").expect("empty").is_empty());
    assert!(conn.execute_script("  ;  ").expect("bare semicolon").is_empty());
}

#[test]
fn test_script_stops_at_first_failure() {
    let conn = memory_with_table("CREATE TABLE t (x);");
    let err = conn
        .execute_script("INSERT INTO t VALUES (1); SELEC oops; INSERT INTO t VALUES (2);")
        .expect_err("syntax error in second unit");
    assert_eq!(err.code(), Some(1));
    let count = conn.execute("SELECT count(*) FROM t", &Params::None).expect("count");
    assert_eq!(count.rows()[0][0], Value::Integer(1));
    assert_eq!(conn.outstanding_statements().expect("count"), 0);
}
