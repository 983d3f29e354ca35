use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

use super::errors::FeedError;

/// One flat question row as served by the remote sheet endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, rename = "subTopic", alias = "sub_topic")]
    pub sub_topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedBatch {
    pub records: Vec<FeedRecord>,
    pub skipped_count: u64,
    pub last_error: Option<String>,
    /// SHA-256 of the raw payload.
    pub fingerprint: String,
}

impl FeedBatch {
    pub fn from_records(records: Vec<FeedRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }
}

/// Accepts a bare array, `{ "questions": [...] }`, or the API envelope
/// `{ "data": { "questions": [...] } }`. Rows that do not deserialize are
/// skipped and counted.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedBatch, FeedError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let rows = extract_rows(value)?;

    let mut batch = FeedBatch {
        fingerprint: fingerprint(bytes),
        ..FeedBatch::default()
    };
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<FeedRecord>(row) {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                warn!(index, error = %err, "skipping malformed feed record");
                batch.skipped_count += 1;
                batch.last_error = Some(format!("record {}: {}", index, err));
            }
        }
    }
    Ok(batch)
}

fn extract_rows(value: Value) -> Result<Vec<Value>, FeedError> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => {
            if let Some(Value::Array(rows)) = map.remove("questions") {
                return Ok(rows);
            }
            match map.remove("data") {
                Some(inner @ (Value::Object(_) | Value::Array(_))) => extract_rows(inner),
                _ => Err(FeedError::InvalidShape(
                    "expected an array, `questions`, or `data.questions`".to_string(),
                )),
            }
        }
        _ => Err(FeedError::InvalidShape(
            "feed document must be a JSON array or object".to_string(),
        )),
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{parse_feed, FeedError};

    #[test]
    fn parses_api_envelope() {
        let raw = br#"{"success":true,"data":{"questions":[
            {"_id":"a","title":"Q1","topic":"Arrays","subTopic":"Basics","difficulty":"easy"},
            {"_id":"b","title":"Q2"}
        ]}}"#;
        let batch = parse_feed(raw).expect("envelope should parse");
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].id, "a");
        assert_eq!(batch.records[0].sub_topic.as_deref(), Some("Basics"));
        assert_eq!(batch.records[1].topic, None);
        assert_eq!(batch.skipped_count, 0);
        assert_eq!(batch.fingerprint.len(), 64);
    }

    #[test]
    fn parses_bare_array_and_aliases() {
        let raw = br#"[{"id":"x","title":"Q","sub_topic":"Intro"}]"#;
        let batch = parse_feed(raw).expect("array should parse");
        assert_eq!(batch.records[0].id, "x");
        assert_eq!(batch.records[0].sub_topic.as_deref(), Some("Intro"));
    }

    #[test]
    fn skips_records_without_title() {
        let raw = br#"{"questions":[{"_id":"a"},{"_id":"b","title":"Kept"}]}"#;
        let batch = parse_feed(raw).expect("questions object should parse");
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].title, "Kept");
        assert_eq!(batch.skipped_count, 1);
        assert!(batch
            .last_error
            .as_deref()
            .is_some_and(|message| message.starts_with("record 0")));
    }

    #[test]
    fn rejects_unknown_document_shape() {
        assert!(matches!(
            parse_feed(br#"{"data":{"items":[]}}"#),
            Err(FeedError::InvalidShape(_))
        ));
        assert!(matches!(parse_feed(b"42"), Err(FeedError::InvalidShape(_))));
        assert!(matches!(parse_feed(b"not json"), Err(FeedError::Json(_))));
    }
}
