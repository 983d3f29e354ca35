//! Groups flat feed records into the topic / sub-topic / question tree.
//!
//! Topics and sub-topics are keyed by title while grouping, in first-seen
//! order, but their ids come from the [`IdGenerator`] so that two titles can
//! never produce colliding ids. Question ids keep the feed `_id` unless it is
//! blank or already used somewhere in the tree.
//!
//! Titles group by their exact text. Only a missing or empty title takes
//! the default, so `" Arrays"` and `"Arrays"` stay separate topics.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::domain::{Difficulty, Question, Sheet, SubTopic, Topic};
use crate::feed::FeedRecord;
use crate::ids::{IdGenerator, NodeKind};

pub const DEFAULT_TOPIC_TITLE: &str = "Untitled Topic";
pub const DEFAULT_SUB_TOPIC_TITLE: &str = "General";

/// Case-insensitive match against easy / medium / hard. Anything else,
/// including a missing label, silently becomes `Easy`.
pub fn normalize_difficulty(raw: Option<&str>) -> Difficulty {
    let Some(label) = raw else {
        return Difficulty::Easy;
    };
    match Difficulty::from_str(label) {
        Ok(difficulty) => difficulty,
        Err(_) => {
            if !label.trim().is_empty() {
                debug!(label, "unrecognized difficulty label, defaulting to Easy");
            }
            Difficulty::Easy
        }
    }
}

struct TopicAcc {
    topic: Topic,
    sub_index: HashMap<String, usize>,
}

pub fn build_sheet_tree(records: &[FeedRecord], ids: &mut dyn IdGenerator) -> Sheet {
    let mut used: HashSet<String> = HashSet::new();
    let mut topics: Vec<TopicAcc> = Vec::new();
    let mut topic_index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let topic_title = title_or(record.topic.as_deref(), DEFAULT_TOPIC_TITLE);
        let sub_title = title_or(record.sub_topic.as_deref(), DEFAULT_SUB_TOPIC_TITLE);

        let topic_pos = match topic_index.get(topic_title) {
            Some(pos) => *pos,
            None => {
                let id = claim_id(ids, NodeKind::Topic, &mut used);
                topics.push(TopicAcc {
                    topic: Topic::new(id, topic_title),
                    sub_index: HashMap::new(),
                });
                topic_index.insert(topic_title.to_string(), topics.len() - 1);
                topics.len() - 1
            }
        };
        let acc = &mut topics[topic_pos];

        let sub_pos = match acc.sub_index.get(sub_title) {
            Some(pos) => *pos,
            None => {
                let id = claim_id(ids, NodeKind::SubTopic, &mut used);
                acc.topic.sub_topics.push(SubTopic::new(id, sub_title));
                let pos = acc.topic.sub_topics.len() - 1;
                acc.sub_index.insert(sub_title.to_string(), pos);
                pos
            }
        };

        let question_id = question_id(record, ids, &mut used);
        acc.topic.sub_topics[sub_pos].questions.push(Question {
            id: question_id,
            title: record.title.clone(),
            difficulty: normalize_difficulty(record.difficulty.as_deref()),
            solved: false,
            starred: false,
        });
    }

    Sheet::new(topics.into_iter().map(|acc| acc.topic).collect())
}

fn title_or<'a>(raw: Option<&'a str>, fallback: &'a str) -> &'a str {
    match raw {
        Some(title) if !title.is_empty() => title,
        _ => fallback,
    }
}

fn claim_id(ids: &mut dyn IdGenerator, kind: NodeKind, used: &mut HashSet<String>) -> String {
    let id = ids.next_id(kind, &|candidate: &str| used.contains(candidate));
    used.insert(id.clone());
    id
}

fn question_id(record: &FeedRecord, ids: &mut dyn IdGenerator, used: &mut HashSet<String>) -> String {
    let raw = record.id.trim();
    if raw.is_empty() {
        warn!(title = %record.title, "feed record has no id, synthesizing one");
        return claim_id(ids, NodeKind::Question, used);
    }
    if used.contains(raw) {
        warn!(id = raw, title = %record.title, "duplicate feed id, synthesizing a fresh one");
        return claim_id(ids, NodeKind::Question, used);
    }
    used.insert(raw.to_string());
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::{build_sheet_tree, normalize_difficulty, DEFAULT_SUB_TOPIC_TITLE, DEFAULT_TOPIC_TITLE};
    use crate::domain::Difficulty;
    use crate::feed::FeedRecord;
    use crate::ids::SequentialIds;

    fn record(id: &str, title: &str, topic: Option<&str>, sub: Option<&str>) -> FeedRecord {
        FeedRecord {
            id: id.to_string(),
            title: title.to_string(),
            topic: topic.map(str::to_string),
            sub_topic: sub.map(str::to_string),
            difficulty: None,
        }
    }

    #[test]
    fn difficulty_normalization_is_total() {
        let cases = [
            (Some("Easy"), Difficulty::Easy),
            (Some("medium"), Difficulty::Medium),
            (Some("HARD"), Difficulty::Hard),
            (Some(""), Difficulty::Easy),
            (None, Difficulty::Easy),
            (Some("bogus"), Difficulty::Easy),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_difficulty(raw), expected, "input {raw:?}");
        }
    }

    #[test]
    fn groups_two_records_under_one_topic_and_sub_topic() {
        let mut a = record("a", "Q1", Some("Arrays"), Some("Basics"));
        a.difficulty = Some("easy".to_string());
        let mut b = record("b", "Q2", Some("Arrays"), Some("Basics"));
        b.difficulty = Some("hard".to_string());

        let sheet = build_sheet_tree(&[a, b], &mut SequentialIds::new());
        assert_eq!(sheet.topics.len(), 1);
        let topic = &sheet.topics[0];
        assert_eq!(topic.title, "Arrays");
        assert_eq!(topic.sub_topics.len(), 1);
        let sub = &topic.sub_topics[0];
        assert_eq!(sub.title, "Basics");
        let titles = sub.questions.iter().map(|q| q.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Q1", "Q2"]);
        assert_eq!(sub.questions[0].difficulty, Difficulty::Easy);
        assert_eq!(sub.questions[1].difficulty, Difficulty::Hard);
        assert_eq!(sub.questions[0].id, "a");
        assert!(sub.questions.iter().all(|q| !q.solved && !q.starred));
    }

    #[test]
    fn missing_names_fall_back_to_defaults() {
        let sheet = build_sheet_tree(
            &[
                record("a", "Q1", None, None),
                record("b", "Q2", None, Some("")),
            ],
            &mut SequentialIds::new(),
        );
        assert_eq!(sheet.topics.len(), 1);
        assert_eq!(sheet.topics[0].title, DEFAULT_TOPIC_TITLE);
        assert_eq!(sheet.topics[0].sub_topics[0].title, DEFAULT_SUB_TOPIC_TITLE);
        assert_eq!(sheet.topics[0].sub_topics[0].questions.len(), 2);
    }

    #[test]
    fn titles_group_by_exact_text() {
        let sheet = build_sheet_tree(
            &[
                record("a", "Q1", Some("Arrays"), None),
                record("b", "Q2", Some(" Arrays"), None),
                record("c", "Q3", Some("  "), None),
            ],
            &mut SequentialIds::new(),
        );
        let topics = sheet.topics.iter().map(|t| t.title.as_str()).collect::<Vec<_>>();
        assert_eq!(topics, vec!["Arrays", " Arrays", "  "]);
    }

    #[test]
    fn keeps_first_seen_order_for_topics_and_sub_topics() {
        let sheet = build_sheet_tree(
            &[
                record("1", "Q1", Some("Graphs"), Some("BFS")),
                record("2", "Q2", Some("Arrays"), Some("Basics")),
                record("3", "Q3", Some("Graphs"), Some("DFS")),
                record("4", "Q4", Some("Graphs"), Some("BFS")),
            ],
            &mut SequentialIds::new(),
        );
        let topics = sheet.topics.iter().map(|t| t.title.as_str()).collect::<Vec<_>>();
        assert_eq!(topics, vec!["Graphs", "Arrays"]);
        let graphs = &sheet.topics[0];
        let subs = graphs.sub_topics.iter().map(|s| s.title.as_str()).collect::<Vec<_>>();
        assert_eq!(subs, vec!["BFS", "DFS"]);
        assert_eq!(graphs.sub_topics[0].questions.len(), 2);
    }

    #[test]
    fn titles_that_concatenate_alike_get_distinct_ids() {
        let sheet = build_sheet_tree(
            &[
                record("1", "Q1", Some("a-b"), Some("c")),
                record("2", "Q2", Some("a"), Some("b-c")),
                record("3", "Q3", Some("a-b-c"), None),
            ],
            &mut SequentialIds::new(),
        );
        let mut ids = Vec::new();
        for topic in &sheet.topics {
            ids.push(topic.id.clone());
            for sub in &topic.sub_topics {
                ids.push(sub.id.clone());
            }
        }
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert!(sheet.topics.iter().all(|topic| topic.id != topic.title));
    }

    #[test]
    fn duplicate_or_blank_feed_ids_are_replaced() {
        let sheet = build_sheet_tree(
            &[
                record("dup", "Q1", Some("Arrays"), None),
                record("dup", "Q2", Some("Arrays"), None),
                record("", "Q3", Some("Arrays"), None),
            ],
            &mut SequentialIds::new(),
        );
        let questions = &sheet.topics[0].sub_topics[0].questions;
        assert_eq!(questions[0].id, "dup");
        assert_ne!(questions[1].id, "dup");
        assert!(questions[1].id.starts_with("Q-"));
        assert!(questions[2].id.starts_with("Q-"));
        assert_ne!(questions[1].id, questions[2].id);
    }

    #[test]
    fn empty_feed_builds_empty_sheet() {
        let sheet = build_sheet_tree(&[], &mut SequentialIds::new());
        assert!(sheet.is_empty());
    }
}
