use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::Sheet;
use crate::ids::{HashedIds, IdGenerator, NodeKind};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_STORAGE_KEY: &str = "question-sheet-store";

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    topics: &'a Sheet,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    #[serde(default)]
    version: Option<u32>,
    topics: Sheet,
}

pub fn encode(sheet: &Sheet) -> Result<String, SnapshotError> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_SCHEMA_VERSION,
        topics: sheet,
    };
    Ok(serde_json::to_string(&snapshot)?)
}

pub fn encode_pretty(sheet: &Sheet) -> Result<String, SnapshotError> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_SCHEMA_VERSION,
        topics: sheet,
    };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Decodes `{ version, topics }`. A payload without `version` predates
/// versioning and is read as the current schema. Ids that repeat anywhere in
/// the tree are re-keyed so every id-only lookup stays unambiguous.
pub fn decode(raw: &str) -> Result<Sheet, SnapshotError> {
    let snapshot: SnapshotOwned = serde_json::from_str(raw)?;
    if let Some(version) = snapshot.version {
        if version > SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }
    }
    let mut sheet = snapshot.topics;
    let rekeyed = rekey_duplicate_ids(&mut sheet, &mut HashedIds);
    if rekeyed > 0 {
        warn!(rekeyed, "snapshot carried colliding ids");
    }
    Ok(sheet)
}

/// Walks the tree in order; the first node to use an id keeps it, and any
/// later node with the same (or a blank) id gets a fresh one. Returns how
/// many nodes were re-keyed.
pub fn rekey_duplicate_ids(sheet: &mut Sheet, ids: &mut dyn IdGenerator) -> usize {
    let mut present: HashSet<String> = HashSet::new();
    for topic in &sheet.topics {
        present.insert(topic.id.clone());
        for sub in &topic.sub_topics {
            present.insert(sub.id.clone());
            present.extend(sub.questions.iter().map(|question| question.id.clone()));
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut rekeyed = 0;
    let mut claim = |id: &mut String, kind: NodeKind| {
        if claim_unique(id, kind, ids, &mut seen, &mut present) {
            rekeyed += 1;
        }
    };
    for topic in &mut sheet.topics {
        claim(&mut topic.id, NodeKind::Topic);
        for sub in &mut topic.sub_topics {
            claim(&mut sub.id, NodeKind::SubTopic);
            for question in &mut sub.questions {
                claim(&mut question.id, NodeKind::Question);
            }
        }
    }
    rekeyed
}

fn claim_unique(
    id: &mut String,
    kind: NodeKind,
    ids: &mut dyn IdGenerator,
    seen: &mut HashSet<String>,
    present: &mut HashSet<String>,
) -> bool {
    if !id.is_empty() && seen.insert(id.clone()) {
        return false;
    }
    let fresh = ids.next_id(kind, &|candidate: &str| {
        present.contains(candidate) || seen.contains(candidate)
    });
    debug!(old = %id, new = %fresh, "re-keyed snapshot node");
    present.insert(fresh.clone());
    seen.insert(fresh.clone());
    *id = fresh;
    true
}

/// Receives the whole sheet after every committed mutation.
pub trait SnapshotSink {
    fn persist(&mut self, sheet: &Sheet) -> Result<(), SnapshotError>;
}

/// Keeps every persisted payload in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    payloads: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn latest(&self) -> Option<Sheet> {
        let payloads = self.payloads();
        let raw = payloads.last()?;
        decode(raw).ok()
    }
}

impl SnapshotSink for MemorySink {
    fn persist(&mut self, sheet: &Sheet) -> Result<(), SnapshotError> {
        let payload = encode(sheet)?;
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload);
        Ok(())
    }
}

/// Hands snapshots to a writer thread so a slow sink never delays a mutation.
/// Queued snapshots collapse to the newest one. Dropping the sink flushes
/// whatever is still queued.
pub struct BackgroundSink {
    sender: Option<Sender<Sheet>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundSink {
    pub fn spawn<S>(inner: S) -> Self
    where
        S: SnapshotSink + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::spawn(move || run_writer(inner, receiver));
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }
}

fn run_writer<S: SnapshotSink>(mut inner: S, receiver: Receiver<Sheet>) {
    while let Ok(mut sheet) = receiver.recv() {
        let mut skipped = 0usize;
        while let Ok(newer) = receiver.try_recv() {
            sheet = newer;
            skipped += 1;
        }
        if skipped > 0 {
            debug!(skipped, "coalesced queued snapshots");
        }
        if let Err(err) = inner.persist(&sheet) {
            warn!(error = %err, "background snapshot write failed");
        }
    }
}

impl SnapshotSink for BackgroundSink {
    fn persist(&mut self, sheet: &Sheet) -> Result<(), SnapshotError> {
        let sender = self.sender.as_ref().ok_or(SnapshotError::WriterClosed)?;
        sender
            .send(sheet.clone())
            .map_err(|_| SnapshotError::WriterClosed)
    }
}

impl Drop for BackgroundSink {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("snapshot writer thread panicked");
            }
        }
    }
}

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    UnsupportedVersion(u32),
    Storage(String),
    WriterClosed,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Json(err) => write!(f, "JSON error: {}", err),
            SnapshotError::UnsupportedVersion(version) => write!(
                f,
                "snapshot schema version {} is newer than supported version {}",
                version, SNAPSHOT_SCHEMA_VERSION
            ),
            SnapshotError::Storage(message) => write!(f, "storage error: {}", message),
            SnapshotError::WriterClosed => write!(f, "snapshot writer is closed"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SnapshotError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        SnapshotError::Json(value)
    }
}
