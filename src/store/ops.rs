//! Pure tree mutations. Each method leaves `self` untouched and returns the
//! next sheet; an id that matches nothing yields an unchanged copy.

use crate::domain::{Difficulty, Question, Sheet, SubTopic, Topic};

use super::error::TreeError;

/// Extract the element at `from` and reinsert it at `to` in the shortened
/// sequence. `to` is clamped to the end.
pub fn reorder<T: Clone>(items: &[T], from: usize, to: usize) -> Result<Vec<T>, TreeError> {
    let mut reordered = items.to_vec();
    reorder_in_place(&mut reordered, from, to)?;
    Ok(reordered)
}

fn reorder_in_place<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), TreeError> {
    if from >= items.len() {
        return Err(TreeError::IndexOutOfRange {
            index: from,
            len: items.len(),
        });
    }
    let moved = items.remove(from);
    let target = to.min(items.len());
    items.insert(target, moved);
    Ok(())
}

impl Sheet {
    #[must_use]
    pub fn add_topic(&self, id: impl Into<String>, title: &str) -> Sheet {
        let mut next = self.clone();
        next.topics.push(Topic::new(id, title));
        next
    }

    #[must_use]
    pub fn update_topic(&self, topic_id: &str, title: &str) -> Sheet {
        self.map_topic(topic_id, |topic| topic.title = title.to_string())
    }

    #[must_use]
    pub fn delete_topic(&self, topic_id: &str) -> Sheet {
        let mut next = self.clone();
        next.topics.retain(|topic| topic.id != topic_id);
        next
    }

    pub fn reorder_topics(&self, from: usize, to: usize) -> Result<Sheet, TreeError> {
        let mut next = self.clone();
        reorder_in_place(&mut next.topics, from, to)?;
        Ok(next)
    }

    #[must_use]
    pub fn add_sub_topic(&self, topic_id: &str, id: impl Into<String>, title: &str) -> Sheet {
        let sub = SubTopic::new(id, title);
        self.map_topic(topic_id, |topic| topic.sub_topics.push(sub))
    }

    #[must_use]
    pub fn update_sub_topic(&self, topic_id: &str, sub_topic_id: &str, title: &str) -> Sheet {
        self.map_sub_topic(topic_id, sub_topic_id, |sub| sub.title = title.to_string())
    }

    #[must_use]
    pub fn delete_sub_topic(&self, topic_id: &str, sub_topic_id: &str) -> Sheet {
        self.map_topic(topic_id, |topic| {
            topic.sub_topics.retain(|sub| sub.id != sub_topic_id)
        })
    }

    pub fn reorder_sub_topics(
        &self,
        topic_id: &str,
        from: usize,
        to: usize,
    ) -> Result<Sheet, TreeError> {
        let mut next = self.clone();
        if let Some(topic) = next.topic_mut(topic_id) {
            reorder_in_place(&mut topic.sub_topics, from, to)?;
        }
        Ok(next)
    }

    #[must_use]
    pub fn add_question(
        &self,
        topic_id: &str,
        sub_topic_id: &str,
        id: impl Into<String>,
        title: &str,
    ) -> Sheet {
        let question = Question::new(id, title);
        self.map_sub_topic(topic_id, sub_topic_id, |sub| sub.questions.push(question))
    }

    #[must_use]
    pub fn update_question(
        &self,
        topic_id: &str,
        sub_topic_id: &str,
        question_id: &str,
        title: &str,
    ) -> Sheet {
        self.map_question(topic_id, sub_topic_id, question_id, |question| {
            question.title = title.to_string()
        })
    }

    #[must_use]
    pub fn delete_question(&self, topic_id: &str, sub_topic_id: &str, question_id: &str) -> Sheet {
        self.map_sub_topic(topic_id, sub_topic_id, |sub| {
            sub.questions.retain(|question| question.id != question_id)
        })
    }

    pub fn reorder_questions(
        &self,
        topic_id: &str,
        sub_topic_id: &str,
        from: usize,
        to: usize,
    ) -> Result<Sheet, TreeError> {
        let mut next = self.clone();
        if let Some(sub) = next.sub_topic_mut(topic_id, sub_topic_id) {
            reorder_in_place(&mut sub.questions, from, to)?;
        }
        Ok(next)
    }

    #[must_use]
    pub fn toggle_solved(&self, topic_id: &str, sub_topic_id: &str, question_id: &str) -> Sheet {
        self.map_question(topic_id, sub_topic_id, question_id, |question| {
            question.solved = !question.solved
        })
    }

    #[must_use]
    pub fn toggle_star(&self, topic_id: &str, sub_topic_id: &str, question_id: &str) -> Sheet {
        self.map_question(topic_id, sub_topic_id, question_id, |question| {
            question.starred = !question.starred
        })
    }

    #[must_use]
    pub fn set_question_difficulty(
        &self,
        topic_id: &str,
        sub_topic_id: &str,
        question_id: &str,
        difficulty: Difficulty,
    ) -> Sheet {
        self.map_question(topic_id, sub_topic_id, question_id, |question| {
            question.difficulty = difficulty
        })
    }

    fn topic_mut(&mut self, topic_id: &str) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|topic| topic.id == topic_id)
    }

    fn sub_topic_mut(&mut self, topic_id: &str, sub_topic_id: &str) -> Option<&mut SubTopic> {
        self.topic_mut(topic_id)?
            .sub_topics
            .iter_mut()
            .find(|sub| sub.id == sub_topic_id)
    }

    fn map_topic(&self, topic_id: &str, edit: impl FnOnce(&mut Topic)) -> Sheet {
        let mut next = self.clone();
        if let Some(topic) = next.topic_mut(topic_id) {
            edit(topic);
        }
        next
    }

    fn map_sub_topic(
        &self,
        topic_id: &str,
        sub_topic_id: &str,
        edit: impl FnOnce(&mut SubTopic),
    ) -> Sheet {
        let mut next = self.clone();
        if let Some(sub) = next.sub_topic_mut(topic_id, sub_topic_id) {
            edit(sub);
        }
        next
    }

    fn map_question(
        &self,
        topic_id: &str,
        sub_topic_id: &str,
        question_id: &str,
        edit: impl FnOnce(&mut Question),
    ) -> Sheet {
        let mut next = self.clone();
        if let Some(question) = next
            .sub_topic_mut(topic_id, sub_topic_id)
            .and_then(|sub| sub.questions.iter_mut().find(|q| q.id == question_id))
        {
            edit(question);
        }
        next
    }
}
