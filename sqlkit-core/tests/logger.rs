//! Log forwarding to a foreign logger.

use std::sync::{Arc, Mutex};

use sqlkit_core::logger::{set_logger, LogLevel, Logger};
use sqlkit_core::{Database, OpenFlag};

#[derive(Default)]
struct Recorder {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl Logger for Recorder {
    fn log(&self, level: LogLevel, message: String) {
        self.records.lock().expect("lock").push((level, message));
    }
}

#[tokio::test]
async fn test_records_reach_foreign_logger() {
    let recorder = Arc::new(Recorder::default());
    set_logger(recorder.clone());

    let db = Database::open(
        ":memory:".to_string(),
        vec![OpenFlag::ReadWrite, OpenFlag::Create],
        None,
    )
    .await
    .expect("open");
    db.close().await.expect("close");

    let records = recorder.records.lock().expect("lock");
    assert!(
        records
            .iter()
            .any(|(level, message)| *level == LogLevel::Debug && message.contains("opened database")),
        "{records:?}"
    );
    assert!(records.iter().any(|(_, message)| message.contains("closed database")));
}
