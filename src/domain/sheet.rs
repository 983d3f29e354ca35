use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;

/// Root of the checklist: an ordered list of topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sheet {
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sub_topics: Vec<SubTopic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub solved: bool,
    #[serde(default)]
    pub starred: bool,
}

/// Solved versus total question count. Always derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub solved: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(self) -> bool {
        self.total > 0 && self.solved == self.total
    }

    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.solved * 100) / self.total) as u8
    }

    fn add(self, other: Progress) -> Progress {
        Progress {
            solved: self.solved + other.solved,
            total: self.total + other.total,
        }
    }
}

impl Sheet {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn topic(&self, topic_id: &str) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.id == topic_id)
    }

    pub fn sub_topic(&self, topic_id: &str, sub_topic_id: &str) -> Option<&SubTopic> {
        self.topic(topic_id)?.sub_topic(sub_topic_id)
    }

    pub fn question(
        &self,
        topic_id: &str,
        sub_topic_id: &str,
        question_id: &str,
    ) -> Option<&Question> {
        self.sub_topic(topic_id, sub_topic_id)?
            .questions
            .iter()
            .find(|question| question.id == question_id)
    }

    /// True when any node at any level already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.topics.iter().any(|topic| {
            topic.id == id
                || topic.sub_topics.iter().any(|sub| {
                    sub.id == id || sub.questions.iter().any(|question| question.id == id)
                })
        })
    }

    /// The topic that owns sub-topic `sub_topic_id`.
    pub fn locate_sub_topic(&self, sub_topic_id: &str) -> Option<&Topic> {
        self.topics
            .iter()
            .find(|topic| topic.sub_topic(sub_topic_id).is_some())
    }

    /// The topic and sub-topic that own question `question_id`.
    pub fn locate_question(&self, question_id: &str) -> Option<(&Topic, &SubTopic)> {
        self.topics.iter().find_map(|topic| {
            topic
                .sub_topics
                .iter()
                .find(|sub| sub.questions.iter().any(|question| question.id == question_id))
                .map(|sub| (topic, sub))
        })
    }

    pub fn question_count(&self) -> usize {
        self.topics
            .iter()
            .flat_map(|topic| topic.sub_topics.iter())
            .map(|sub| sub.questions.len())
            .sum()
    }

    pub fn progress(&self) -> Progress {
        self.topics
            .iter()
            .map(Topic::progress)
            .fold(Progress::default(), Progress::add)
    }
}

impl Topic {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sub_topics: Vec::new(),
        }
    }

    pub fn sub_topic(&self, sub_topic_id: &str) -> Option<&SubTopic> {
        self.sub_topics.iter().find(|sub| sub.id == sub_topic_id)
    }

    pub fn progress(&self) -> Progress {
        self.sub_topics
            .iter()
            .map(SubTopic::progress)
            .fold(Progress::default(), Progress::add)
    }
}

impl SubTopic {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            questions: Vec::new(),
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            solved: self.questions.iter().filter(|q| q.solved).count(),
            total: self.questions.len(),
        }
    }
}

impl Question {
    /// A freshly added question: easy, unsolved, unstarred.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            difficulty: Difficulty::Easy,
            solved: false,
            starred: false,
        }
    }
}
