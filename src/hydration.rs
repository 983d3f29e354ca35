//! One-shot population of an empty sheet from a feed source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use crate::feed::SheetSource;
use crate::ids::{HashedIds, IdGenerator};
use crate::normalize::build_sheet_tree;
use crate::store::SheetStore;


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HydrationSummary {
    pub source: String,
    pub fingerprint: String,
    pub topics: usize,
    pub questions: usize,
    pub skipped_records: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HydrationState {
    #[default]
    Idle,
    Loading,
    Ready(HydrationSummary),
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationOutcome {
    Installed(HydrationSummary),
    SkippedNonEmpty,
    SkippedInFlight,
    Failed(String),
    Aborted,
}

impl HydrationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HydrationOutcome::Installed(_) => "installed",
            HydrationOutcome::SkippedNonEmpty => "skipped_non_empty",
            HydrationOutcome::SkippedInFlight => "skipped_in_flight",
            HydrationOutcome::Failed(_) => "failed",
            HydrationOutcome::Aborted => "aborted",
        }
    }
}

/// Guards hydration so that at most one fetch is outstanding and a fetched
/// tree is installed only into a store that is still empty.
pub struct HydrationController {
    in_flight: AtomicBool,
    aborted: AtomicBool,
    state: Mutex<HydrationState>,
    ids: Mutex<Box<dyn IdGenerator + Send>>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl HydrationController {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            state: Mutex::new(HydrationState::Idle),
            ids: Mutex::new(Box::new(HashedIds)),
        }
    }

    pub fn with_ids<G>(self, ids: G) -> Self
    where
        G: IdGenerator + Send + 'static,
    {
        Self {
            ids: Mutex::new(Box::new(ids)),
            ..self
        }
    }

    pub fn state(&self) -> HydrationState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stops any pending or future hydration from writing into the store.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn hydrate(&self, store: &Mutex<SheetStore>, source: &dyn SheetSource) -> HydrationOutcome {
        if self.is_aborted() {
            return HydrationOutcome::Aborted;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!(source = %source.describe(), "hydration already in flight");
            return HydrationOutcome::SkippedInFlight;
        }
        let _guard = InFlight(&self.in_flight);

        if !lock_store(store).is_empty() {
            return HydrationOutcome::SkippedNonEmpty;
        }

        self.set_state(HydrationState::Loading);
        let batch = match source.fetch() {
            Ok(batch) => batch,
            Err(err) => {
                let message = err.to_string();
                warn!(source = %source.describe(), error = %message, "hydration fetch failed");
                self.set_state(HydrationState::Failed {
                    message: message.clone(),
                });
                return HydrationOutcome::Failed(message);
            }
        };

        if self.is_aborted() {
            self.set_state(HydrationState::Idle);
            return HydrationOutcome::Aborted;
        }

        let sheet = {
            let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
            build_sheet_tree(&batch.records, &mut **ids)
        };
        if sheet.is_empty() {
            let message = format!(
                "feed contained no questions ({} record(s) skipped)",
                batch.skipped_count
            );
            warn!(source = %source.describe(), "hydration fetched an empty feed");
            self.set_state(HydrationState::Failed {
                message: message.clone(),
            });
            return HydrationOutcome::Failed(message);
        }
        let summary = HydrationSummary {
            source: source.describe(),
            fingerprint: batch.fingerprint.clone(),
            topics: sheet.topics.len(),
            questions: sheet.question_count(),
            skipped_records: batch.skipped_count,
        };

        let mut store = lock_store(store);
        if !store.is_empty() {
            self.set_state(HydrationState::Idle);
            return HydrationOutcome::SkippedNonEmpty;
        }
        store.replace(sheet);
        drop(store);

        info!(
            source = %summary.source,
            topics = summary.topics,
            questions = summary.questions,
            skipped = summary.skipped_records,
            "sheet hydrated"
        );
        self.set_state(HydrationState::Ready(summary.clone()));
        HydrationOutcome::Installed(summary)
    }

    fn set_state(&self, next: HydrationState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl Default for HydrationController {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_store(store: &Mutex<SheetStore>) -> MutexGuard<'_, SheetStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
