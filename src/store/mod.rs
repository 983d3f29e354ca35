mod error;
mod ops;

pub use error::TreeError;
pub use ops::reorder;

use tracing::{debug, warn};

use crate::domain::{Difficulty, Sheet};
use crate::ids::{HashedIds, IdGenerator, NodeKind};
use crate::snapshot::SnapshotSink;

/// Owns the canonical sheet. Every mutation swaps in a new tree built by the
/// pure operations in `ops` and, when the tree actually changed, hands it to
/// the snapshot sink. Sink failures are logged and never reach the caller.
pub struct SheetStore {
    sheet: Sheet,
    ids: Box<dyn IdGenerator + Send>,
    sink: Option<Box<dyn SnapshotSink + Send>>,
}

impl SheetStore {
    pub fn new(sheet: Sheet) -> Self {
        Self {
            sheet,
            ids: Box::new(HashedIds),
            sink: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Sheet::default())
    }

    pub fn with_ids<G>(mut self, ids: G) -> Self
    where
        G: IdGenerator + Send + 'static,
    {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: SnapshotSink + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn is_empty(&self) -> bool {
        self.sheet.is_empty()
    }

    /// Swap in a whole tree, as hydration does.
    pub fn replace(&mut self, sheet: Sheet) -> bool {
        self.commit(sheet)
    }

    pub fn clear(&mut self) -> bool {
        self.commit(Sheet::default())
    }

    pub fn add_topic(&mut self, title: &str) -> String {
        let id = self.fresh_id(NodeKind::Topic);
        let next = self.sheet.add_topic(id.clone(), title);
        self.commit(next);
        id
    }

    pub fn update_topic(&mut self, topic_id: &str, title: &str) -> bool {
        let next = self.sheet.update_topic(topic_id, title);
        self.commit(next)
    }

    pub fn delete_topic(&mut self, topic_id: &str) -> bool {
        let next = self.sheet.delete_topic(topic_id);
        self.commit(next)
    }

    pub fn reorder_topics(&mut self, from: usize, to: usize) -> Result<bool, TreeError> {
        let next = self.sheet.reorder_topics(from, to)?;
        Ok(self.commit(next))
    }

    /// Returns the new id, or `None` when the topic does not exist.
    pub fn add_sub_topic(&mut self, topic_id: &str, title: &str) -> Option<String> {
        self.sheet.topic(topic_id)?;
        let id = self.fresh_id(NodeKind::SubTopic);
        let next = self.sheet.add_sub_topic(topic_id, id.clone(), title);
        self.commit(next);
        Some(id)
    }

    pub fn update_sub_topic(&mut self, topic_id: &str, sub_topic_id: &str, title: &str) -> bool {
        let next = self.sheet.update_sub_topic(topic_id, sub_topic_id, title);
        self.commit(next)
    }

    pub fn delete_sub_topic(&mut self, topic_id: &str, sub_topic_id: &str) -> bool {
        let next = self.sheet.delete_sub_topic(topic_id, sub_topic_id);
        self.commit(next)
    }

    pub fn reorder_sub_topics(
        &mut self,
        topic_id: &str,
        from: usize,
        to: usize,
    ) -> Result<bool, TreeError> {
        let next = self.sheet.reorder_sub_topics(topic_id, from, to)?;
        Ok(self.commit(next))
    }

    /// Returns the new id, or `None` when the sub-topic does not exist.
    pub fn add_question(
        &mut self,
        topic_id: &str,
        sub_topic_id: &str,
        title: &str,
    ) -> Option<String> {
        self.sheet.sub_topic(topic_id, sub_topic_id)?;
        let id = self.fresh_id(NodeKind::Question);
        let next = self
            .sheet
            .add_question(topic_id, sub_topic_id, id.clone(), title);
        self.commit(next);
        Some(id)
    }

    pub fn update_question(
        &mut self,
        topic_id: &str,
        sub_topic_id: &str,
        question_id: &str,
        title: &str,
    ) -> bool {
        let next = self
            .sheet
            .update_question(topic_id, sub_topic_id, question_id, title);
        self.commit(next)
    }

    pub fn delete_question(
        &mut self,
        topic_id: &str,
        sub_topic_id: &str,
        question_id: &str,
    ) -> bool {
        let next = self
            .sheet
            .delete_question(topic_id, sub_topic_id, question_id);
        self.commit(next)
    }

    pub fn reorder_questions(
        &mut self,
        topic_id: &str,
        sub_topic_id: &str,
        from: usize,
        to: usize,
    ) -> Result<bool, TreeError> {
        let next = self
            .sheet
            .reorder_questions(topic_id, sub_topic_id, from, to)?;
        Ok(self.commit(next))
    }

    pub fn toggle_solved(&mut self, topic_id: &str, sub_topic_id: &str, question_id: &str) -> bool {
        let next = self.sheet.toggle_solved(topic_id, sub_topic_id, question_id);
        self.commit(next)
    }

    pub fn toggle_star(&mut self, topic_id: &str, sub_topic_id: &str, question_id: &str) -> bool {
        let next = self.sheet.toggle_star(topic_id, sub_topic_id, question_id);
        self.commit(next)
    }

    pub fn set_question_difficulty(
        &mut self,
        topic_id: &str,
        sub_topic_id: &str,
        question_id: &str,
        difficulty: Difficulty,
    ) -> bool {
        let next =
            self.sheet
                .set_question_difficulty(topic_id, sub_topic_id, question_id, difficulty);
        self.commit(next)
    }

    fn fresh_id(&mut self, kind: NodeKind) -> String {
        let sheet = &self.sheet;
        self.ids.next_id(kind, &|candidate: &str| sheet.contains_id(candidate))
    }

    fn commit(&mut self, next: Sheet) -> bool {
        if next == self.sheet {
            return false;
        }
        self.sheet = next;
        self.persist();
        true
    }

    fn persist(&mut self) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        match sink.persist(&self.sheet) {
            Ok(()) => debug!(topics = self.sheet.topics.len(), "sheet snapshot persisted"),
            Err(err) => warn!(error = %err, "failed to persist sheet snapshot"),
        }
    }
}

impl Default for SheetStore {
    fn default() -> Self {
        Self::empty()
    }
}
