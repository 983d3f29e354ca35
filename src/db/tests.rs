use super::{
    get_meta, last_hydration, load_sheet, load_snapshot_payload,
    open_connection, record_hydration, save_snapshot, RecordHydration, SqliteSink, StorageError,
    CURRENT_SCHEMA_VERSION,
};
use crate::domain::{Question, Sheet, SubTopic, Topic};
use crate::snapshot::{SnapshotError, SnapshotSink};
use rusqlite::params;
use uuid::Uuid;

const KEY: &str = "question-sheet-store";

fn unique_db_path() -> String {
    std::env::temp_dir()
        .join(format!("qsheet-db-{}.sqlite", Uuid::now_v7()))
        .display()
        .to_string()
}

fn cleanup_db_files(path: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let candidate = format!("{path}{suffix}");
        let _ = std::fs::remove_file(candidate);
    }
}

fn table_exists(conn: &rusqlite::Connection, table_name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
            params![table_name],
            |row| row.get(0),
        )
        .expect("table existence query should be readable");
    exists == 1
}

fn sample_sheet() -> Sheet {
    let mut sub = SubTopic::new("S-1", "Basics");
    sub.questions.push(Question::new("Q-1", "Two Sum"));
    let mut topic = Topic::new("T-1", "Arrays");
    topic.sub_topics.push(sub);
    Sheet::new(vec![topic])
}

#[test]
fn configures_connection_pragmas() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .expect("journal_mode pragma should be readable");
    assert_eq!(journal_mode.to_uppercase(), "WAL");

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .expect("busy_timeout pragma should be readable");
    assert_eq!(busy_timeout, 5000);

    cleanup_db_files(&path);
}

#[test]
fn initializes_tables_and_reapplies_migrations_idempotently() {
    let path = unique_db_path();
    let first = open_connection(&path).expect("first open should initialize schema");
    for table in ["schema_migrations", "meta", "sheet_snapshot", "hydration_runs"] {
        assert!(table_exists(&first, table), "expected table '{}'", table);
    }
    drop(first);

    let second = open_connection(&path).expect("second open should be idempotent");
    let applied: i64 = second
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .expect("schema_migrations count should be queryable");
    assert_eq!(applied, CURRENT_SCHEMA_VERSION);
    assert_eq!(
        get_meta(&second, "schema_version").expect("meta readable"),
        Some(CURRENT_SCHEMA_VERSION.to_string())
    );

    cleanup_db_files(&path);
}

#[test]
fn snapshot_save_load_and_overwrite() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    assert_eq!(load_sheet(&conn, KEY).expect("load empty"), None);
    save_snapshot(&conn, KEY, &Sheet::default()).expect("save empty sheet");
    save_snapshot(&conn, KEY, &sample_sheet()).expect("overwrite with sample");
    assert_eq!(
        load_sheet(&conn, KEY).expect("load saved"),
        Some(sample_sheet())
    );

    let (payload, saved_at) = load_snapshot_payload(&conn, KEY)
        .expect("payload query")
        .expect("payload exists");
    assert!(payload.contains("\"version\":1"));
    assert!(!saved_at.is_empty());

    cleanup_db_files(&path);
}

#[test]
fn newer_snapshot_version_surfaces_as_error() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");
    conn.execute(
        "INSERT INTO sheet_snapshot (storage_key, schema_version, payload, saved_at)
         VALUES (?1, 7, ?2, 'now')",
        params![KEY, r#"{"version":7,"topics":[]}"#],
    )
    .expect("insert future payload");

    assert!(matches!(
        load_sheet(&conn, KEY),
        Err(StorageError::Snapshot(SnapshotError::UnsupportedVersion(7)))
    ));

    cleanup_db_files(&path);
}

#[test]
fn sqlite_sink_persists_under_fixed_key() {
    let path = unique_db_path();
    let mut sink = SqliteSink::open(&path, KEY).expect("sink should open");
    sink.persist(&sample_sheet()).expect("persist");
    drop(sink);

    let conn = open_connection(&path).expect("reopen");
    assert_eq!(
        load_sheet(&conn, KEY).expect("load"),
        Some(sample_sheet())
    );
    assert_eq!(load_sheet(&conn, "other-key").expect("load other"), None);

    cleanup_db_files(&path);
}

#[test]
fn last_hydration_returns_most_recent_run() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");
    assert_eq!(last_hydration(&conn, KEY).expect("query"), None);

    record_hydration(
        &conn,
        &RecordHydration {
            storage_key: KEY,
            source: "file:a.json",
            status: "failed",
            fingerprint: None,
            topic_count: 0,
            question_count: 0,
            skipped_count: 0,
            last_error: Some("boom"),
        },
    )
    .expect("record failure");
    record_hydration(
        &conn,
        &RecordHydration {
            storage_key: KEY,
            source: "file:a.json",
            status: "installed",
            fingerprint: Some("abc"),
            topic_count: 2,
            question_count: 5,
            skipped_count: 1,
            last_error: None,
        },
    )
    .expect("record install");

    let run = last_hydration(&conn, KEY)
        .expect("query")
        .expect("run exists");
    assert_eq!(run.status, "installed");
    assert_eq!(run.fingerprint.as_deref(), Some("abc"));
    assert_eq!(run.question_count, 5);
    assert_eq!(run.skipped_count, 1);

    cleanup_db_files(&path);
}
