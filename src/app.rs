use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigError, SheetConfig};
use crate::db::{self, HydrationRunRecord, RecordHydration, SqliteSink, StorageError};
use crate::domain::{Progress, Sheet};
use crate::feed::{FileSource, HttpSource, SheetSource};
use crate::hydration::{HydrationController, HydrationOutcome, HydrationState};
use crate::snapshot::{self, BackgroundSink, SnapshotError};
use crate::store::{SheetStore, TreeError};

/// Wires the store, its SQLite snapshot sink and the hydration controller
/// together for one process lifetime.
pub struct App {
    store: Mutex<SheetStore>,
    hydration: HydrationController,
    conn: Connection,
    config: SheetConfig,
}

/// Explicit source chosen on the command line, ahead of the configured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOverride {
    File(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HydrateReport {
    pub outcome: String,
    pub source: String,
    pub topics: usize,
    pub questions: usize,
    pub skipped_records: u64,
    pub fingerprint: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusView {
    pub db_path: String,
    pub storage_key: String,
    pub schema_version: Option<String>,
    pub topics: usize,
    pub questions: usize,
    pub progress: Progress,
    pub saved_at: Option<String>,
    pub hydration: HydrationState,
    pub last_hydration: Option<HydrationRunRecord>,
}

impl App {
    pub fn open(config: SheetConfig) -> Result<Self, AppError> {
        ensure_parent_dir(&config.db_path)?;
        let conn = db::open_connection(&config.db_path)?;
        let sheet = db::load_sheet(&conn, &config.storage_key)?.unwrap_or_default();
        info!(
            db = %config.db_path,
            topics = sheet.topics.len(),
            "loaded sheet snapshot"
        );

        let sink = SqliteSink::open(&config.db_path, config.storage_key.clone())?;
        let store = SheetStore::new(sheet).with_sink(BackgroundSink::spawn(sink));
        Ok(Self {
            store: Mutex::new(store),
            hydration: HydrationController::new(),
            conn,
            config,
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn sheet(&self) -> Sheet {
        self.lock().sheet().clone()
    }

    /// Runs `op` against the store while holding its lock.
    pub fn mutate<R>(&self, op: impl FnOnce(&mut SheetStore) -> R) -> R {
        op(&mut self.lock())
    }

    pub fn try_mutate<R>(
        &self,
        op: impl FnOnce(&mut SheetStore) -> Result<R, TreeError>,
    ) -> Result<R, AppError> {
        Ok(op(&mut self.lock())?)
    }

    pub fn resolve_source(
        &self,
        source: Option<SourceOverride>,
    ) -> Result<Box<dyn SheetSource>, AppError> {
        let timeout = self.config.http_timeout();
        match source {
            Some(SourceOverride::File(path)) => Ok(Box::new(FileSource::new(path))),
            Some(SourceOverride::Url(url)) => Ok(Box::new(HttpSource::new(url, timeout))),
            None => {
                if let Some(path) = &self.config.source_file {
                    return Ok(Box::new(FileSource::new(path.clone())));
                }
                if let Some(url) = &self.config.source_url {
                    return Ok(Box::new(HttpSource::new(url.clone(), timeout)));
                }
                Err(AppError::InvalidArgument(
                    "no sheet source configured; pass --file or --url, or set source_file / source_url in the config"
                        .to_string(),
                ))
            }
        }
    }

    pub fn hydrate(&self, source: Option<SourceOverride>) -> Result<HydrateReport, AppError> {
        let source = self.resolve_source(source)?;
        let outcome = self.hydration.hydrate(&self.store, source.as_ref());
        let report = HydrateReport::from_outcome(&outcome, source.describe());
        if !matches!(
            outcome,
            HydrationOutcome::SkippedInFlight | HydrationOutcome::Aborted
        ) {
            self.record_run(&report)?;
        }
        Ok(report)
    }

    /// Hydrates only when the sheet is empty and a source is configured.
    pub fn ensure_hydrated(&self) -> Result<Option<HydrateReport>, AppError> {
        if !self.lock().is_empty() || !self.config.has_source() {
            return Ok(None);
        }
        self.hydrate(None).map(Some)
    }

    pub fn status(&self) -> Result<StatusView, AppError> {
        let sheet = self.sheet();
        let saved_at = db::load_snapshot_payload(&self.conn, &self.config.storage_key)?
            .map(|(_, saved_at)| saved_at);
        Ok(StatusView {
            db_path: self.config.db_path.clone(),
            storage_key: self.config.storage_key.clone(),
            schema_version: db::get_meta(&self.conn, "schema_version")?,
            topics: sheet.topics.len(),
            questions: sheet.question_count(),
            progress: sheet.progress(),
            saved_at,
            hydration: self.hydration.state(),
            last_hydration: self.last_hydration()?,
        })
    }

    pub fn last_hydration(&self) -> Result<Option<HydrationRunRecord>, AppError> {
        Ok(db::last_hydration(&self.conn, &self.config.storage_key)?)
    }

    /// The versioned `{ version, topics }` document for the current sheet.
    pub fn export_snapshot(&self) -> Result<String, AppError> {
        Ok(snapshot::encode_pretty(self.lock().sheet())?)
    }

    /// Empties the sheet so the next hydration can install a fresh tree.
    pub fn reset(&self) -> bool {
        self.lock().clear()
    }

    fn record_run(&self, report: &HydrateReport) -> Result<(), AppError> {
        db::record_hydration(
            &self.conn,
            &RecordHydration {
                storage_key: &self.config.storage_key,
                source: &report.source,
                status: &report.outcome,
                fingerprint: report.fingerprint.as_deref(),
                topic_count: to_i64(report.topics),
                question_count: to_i64(report.questions),
                skipped_count: i64::try_from(report.skipped_records).unwrap_or(i64::MAX),
                last_error: report.error.as_deref(),
            },
        )?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SheetStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.hydration.abort();
    }
}

impl HydrateReport {
    fn from_outcome(outcome: &HydrationOutcome, source: String) -> Self {
        let mut report = Self {
            outcome: outcome.as_str().to_string(),
            source,
            topics: 0,
            questions: 0,
            skipped_records: 0,
            fingerprint: None,
            error: None,
        };
        match outcome {
            HydrationOutcome::Installed(summary) => {
                report.topics = summary.topics;
                report.questions = summary.questions;
                report.skipped_records = summary.skipped_records;
                report.fingerprint = Some(summary.fingerprint.clone());
            }
            HydrationOutcome::Failed(message) => {
                warn!(source = %report.source, error = %message, "hydration failed");
                report.error = Some(message.clone());
            }
            HydrationOutcome::SkippedNonEmpty
            | HydrationOutcome::SkippedInFlight
            | HydrationOutcome::Aborted => {}
        }
        report
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Storage(StorageError),
    Snapshot(SnapshotError),
    Json(serde_json::Error),
    Config(ConfigError),
    Tree(TreeError),
    InvalidArgument(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Db(err) => write!(f, "database error: {}", err),
            AppError::Storage(err) => write!(f, "{}", err),
            AppError::Snapshot(err) => write!(f, "snapshot error: {}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Tree(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(what) => write!(f, "{} not found", what),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Db(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Tree(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        AppError::Storage(value)
    }
}

impl From<SnapshotError> for AppError {
    fn from(value: SnapshotError) -> Self {
        AppError::Snapshot(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Json(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<TreeError> for AppError {
    fn from(value: TreeError) -> Self {
        AppError::Tree(value)
    }
}

#[cfg(test)]
mod tests;
