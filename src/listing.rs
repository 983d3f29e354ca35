use serde::Serialize;

use crate::domain::{Progress, Question, Sheet, SubTopic, Topic};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetListFilter {
    pub unsolved: bool,
    pub starred: bool,
}

impl SheetListFilter {
    pub fn is_empty(&self) -> bool {
        !self.unsolved && !self.starred
    }

    fn matches(&self, question: &Question) -> bool {
        if self.unsolved && question.solved {
            return false;
        }
        if self.starred && !question.starred {
            return false;
        }
        true
    }
}

/// Keeps only matching questions. Sub-topics and topics left without any
/// question are pruned, but only while a filter is active.
pub fn apply_filters(sheet: &Sheet, filter: &SheetListFilter) -> Sheet {
    if filter.is_empty() {
        return sheet.clone();
    }

    let topics = sheet
        .topics
        .iter()
        .filter_map(|topic| {
            let sub_topics = topic
                .sub_topics
                .iter()
                .filter_map(|sub| {
                    let questions = sub
                        .questions
                        .iter()
                        .filter(|question| filter.matches(question))
                        .cloned()
                        .collect::<Vec<_>>();
                    if questions.is_empty() {
                        return None;
                    }
                    Some(SubTopic {
                        questions,
                        ..sub.clone()
                    })
                })
                .collect::<Vec<_>>();
            if sub_topics.is_empty() {
                return None;
            }
            Some(Topic {
                sub_topics,
                ..topic.clone()
            })
        })
        .collect();
    Sheet::new(topics)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicProgress {
    pub id: String,
    pub title: String,
    pub solved: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub topics: Vec<TopicProgress>,
    pub overall: Progress,
    pub percent: u8,
}

pub fn progress_report(sheet: &Sheet) -> ProgressReport {
    let topics = sheet
        .topics
        .iter()
        .map(|topic| {
            let progress = topic.progress();
            TopicProgress {
                id: topic.id.clone(),
                title: topic.title.clone(),
                solved: progress.solved,
                total: progress.total,
                percent: progress.percent(),
            }
        })
        .collect();
    let overall = sheet.progress();
    ProgressReport {
        topics,
        overall,
        percent: overall.percent(),
    }
}
