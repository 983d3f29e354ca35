use std::error::Error;
use std::fmt;
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::Sheet;
use crate::snapshot::{self, SnapshotError, SnapshotSink, SNAPSHOT_SCHEMA_VERSION};

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_snapshot_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sheet_snapshot (
    storage_key TEXT PRIMARY KEY,
    schema_version INTEGER NOT NULL,
    payload TEXT NOT NULL,
    saved_at TEXT NOT NULL
);
"#,
    },
    Migration {
        version: 2,
        name: "hydration_tracking_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS hydration_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    storage_key TEXT NOT NULL,
    source TEXT NOT NULL,
    status TEXT NOT NULL,
    fingerprint TEXT,
    topic_count INTEGER NOT NULL DEFAULT 0,
    question_count INTEGER NOT NULL DEFAULT 0,
    skipped_count INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    ran_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_hydration_runs_storage_key
    ON hydration_runs(storage_key, id);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

fn now_utc_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn save_snapshot(conn: &Connection, storage_key: &str, sheet: &Sheet) -> Result<(), StorageError> {
    let payload = snapshot::encode(sheet)?;
    conn.execute(
        r#"
INSERT INTO sheet_snapshot (storage_key, schema_version, payload, saved_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(storage_key) DO UPDATE SET
    schema_version = excluded.schema_version,
    payload = excluded.payload,
    saved_at = excluded.saved_at
"#,
        params![
            storage_key,
            SNAPSHOT_SCHEMA_VERSION,
            payload,
            now_utc_rfc3339()
        ],
    )?;
    Ok(())
}

/// `None` when nothing has been saved under `storage_key` yet.
pub fn load_sheet(conn: &Connection, storage_key: &str) -> Result<Option<Sheet>, StorageError> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM sheet_snapshot WHERE storage_key = ?1",
            params![storage_key],
            |row| row.get(0),
        )
        .optional()?;
    match payload {
        Some(raw) => Ok(Some(snapshot::decode(&raw)?)),
        None => Ok(None),
    }
}

/// Raw `{ version, topics }` payload plus its save time.
pub fn load_snapshot_payload(
    conn: &Connection,
    storage_key: &str,
) -> Result<Option<(String, String)>> {
    conn.query_row(
        "SELECT payload, saved_at FROM sheet_snapshot WHERE storage_key = ?1",
        params![storage_key],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HydrationRunRecord {
    pub source: String,
    pub status: String,
    pub fingerprint: Option<String>,
    pub topic_count: i64,
    pub question_count: i64,
    pub skipped_count: i64,
    pub last_error: Option<String>,
    pub ran_at: String,
}

pub struct RecordHydration<'a> {
    pub storage_key: &'a str,
    pub source: &'a str,
    pub status: &'a str,
    pub fingerprint: Option<&'a str>,
    pub topic_count: i64,
    pub question_count: i64,
    pub skipped_count: i64,
    pub last_error: Option<&'a str>,
}

pub fn record_hydration(conn: &Connection, args: &RecordHydration<'_>) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO hydration_runs (
    storage_key, source, status, fingerprint, topic_count,
    question_count, skipped_count, last_error, ran_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#,
        params![
            args.storage_key,
            args.source,
            args.status,
            args.fingerprint,
            args.topic_count,
            args.question_count,
            args.skipped_count,
            args.last_error,
            now_utc_rfc3339()
        ],
    )?;
    Ok(())
}

pub fn last_hydration(conn: &Connection, storage_key: &str) -> Result<Option<HydrationRunRecord>> {
    conn.query_row(
        r#"
SELECT source, status, fingerprint, topic_count, question_count,
       skipped_count, last_error, ran_at
FROM hydration_runs
WHERE storage_key = ?1
ORDER BY id DESC
LIMIT 1
"#,
        params![storage_key],
        |row| {
            Ok(HydrationRunRecord {
                source: row.get(0)?,
                status: row.get(1)?,
                fingerprint: row.get(2)?,
                topic_count: row.get(3)?,
                question_count: row.get(4)?,
                skipped_count: row.get(5)?,
                last_error: row.get(6)?,
                ran_at: row.get(7)?,
            })
        },
    )
    .optional()
}

/// Writes every snapshot under one fixed key.
pub struct SqliteSink {
    conn: Connection,
    storage_key: String,
}

impl SqliteSink {
    pub fn open(path: &str, storage_key: impl Into<String>) -> Result<Self> {
        Ok(Self::new(open_connection(path)?, storage_key))
    }

    pub fn new(conn: Connection, storage_key: impl Into<String>) -> Self {
        Self {
            conn,
            storage_key: storage_key.into(),
        }
    }
}

impl SnapshotSink for SqliteSink {
    fn persist(&mut self, sheet: &Sheet) -> Result<(), SnapshotError> {
        save_snapshot(&self.conn, &self.storage_key, sheet).map_err(|err| match err {
            StorageError::Snapshot(inner) => inner,
            StorageError::Sqlite(inner) => SnapshotError::Storage(inner.to_string()),
        })
    }
}

#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Snapshot(SnapshotError),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Sqlite(err) => write!(f, "database error: {}", err),
            StorageError::Snapshot(err) => write!(f, "snapshot error: {}", err),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::Sqlite(err) => Some(err),
            StorageError::Snapshot(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        StorageError::Sqlite(value)
    }
}

impl From<SnapshotError> for StorageError {
    fn from(value: SnapshotError) -> Self {
        StorageError::Snapshot(value)
    }
}

#[cfg(test)]
mod tests;
