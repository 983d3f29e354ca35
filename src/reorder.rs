//! Translates drag-and-drop events (`{activeId, overId}`) into index based
//! reorders on the store.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{SheetStore, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderEvent {
    pub active_id: String,
    #[serde(default)]
    pub over_id: Option<String>,
}

impl ReorderEvent {
    pub fn new(active_id: impl Into<String>, over_id: Option<String>) -> Self {
        Self {
            active_id: active_id.into(),
            over_id,
        }
    }
}

/// Which sibling sequence the dragged item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderScope<'a> {
    Topics,
    SubTopics { topic_id: &'a str },
    Questions { topic_id: &'a str, sub_topic_id: &'a str },
}

/// Positions of `activeId` and `overId` among `ids`, or `None` when the event
/// should not move anything.
pub fn resolve_indices<'a, I>(ids: I, event: &ReorderEvent) -> Option<(usize, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let over_id = event.over_id.as_deref()?;
    if over_id == event.active_id {
        return None;
    }
    let mut from = None;
    let mut to = None;
    for (index, id) in ids.into_iter().enumerate() {
        if id == event.active_id {
            from = Some(index);
        } else if id == over_id {
            to = Some(index);
        }
    }
    Some((from?, to?))
}

/// Returns whether the sheet changed. Unknown ids leave it untouched.
pub fn apply_reorder(
    store: &mut SheetStore,
    scope: ReorderScope<'_>,
    event: &ReorderEvent,
) -> Result<bool, TreeError> {
    let sheet = store.sheet();
    let resolved = match scope {
        ReorderScope::Topics => {
            resolve_indices(sheet.topics.iter().map(|topic| topic.id.as_str()), event)
        }
        ReorderScope::SubTopics { topic_id } => sheet.topic(topic_id).and_then(|topic| {
            resolve_indices(topic.sub_topics.iter().map(|sub| sub.id.as_str()), event)
        }),
        ReorderScope::Questions {
            topic_id,
            sub_topic_id,
        } => sheet.sub_topic(topic_id, sub_topic_id).and_then(|sub| {
            resolve_indices(sub.questions.iter().map(|q| q.id.as_str()), event)
        }),
    };
    let Some((from, to)) = resolved else {
        debug!(active = %event.active_id, over = ?event.over_id, "reorder event ignored");
        return Ok(false);
    };

    match scope {
        ReorderScope::Topics => store.reorder_topics(from, to),
        ReorderScope::SubTopics { topic_id } => store.reorder_sub_topics(topic_id, from, to),
        ReorderScope::Questions {
            topic_id,
            sub_topic_id,
        } => store.reorder_questions(topic_id, sub_topic_id, from, to),
    }
}
