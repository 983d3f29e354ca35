use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use super::errors::FeedError;
use super::record::{parse_feed, FeedBatch};

const MAX_FEED_BYTES: u64 = 32 * 1024 * 1024;

/// Where the flat question list comes from. Implementations fetch once per
/// call and never retry.
pub trait SheetSource: Send + Sync {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<FeedBatch, FeedError>;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SheetSource for FileSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn fetch(&self) -> Result<FeedBatch, FeedError> {
        let bytes = std::fs::read(&self.path)?;
        info!(path = %self.path.display(), bytes = bytes.len(), "read sheet feed");
        parse_feed(&bytes)
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl SheetSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<FeedBatch, FeedError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .get(&self.url)
            .set("Accept", "application/json")
            .call()?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_FEED_BYTES)
            .read_to_end(&mut bytes)?;
        info!(url = %self.url, bytes = bytes.len(), "fetched sheet feed");
        parse_feed(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileSource, SheetSource};
    use crate::feed::FeedError;
    use uuid::Uuid;

    #[test]
    fn file_source_reads_and_parses_feed() {
        let path = std::env::temp_dir().join(format!("qsheet-feed-{}.json", Uuid::now_v7()));
        std::fs::write(&path, r#"[{"_id":"a","title":"Q1","topic":"Arrays"}]"#)
            .expect("feed should be writable");

        let source = FileSource::new(&path);
        assert!(source.describe().starts_with("file:"));
        let batch = source.fetch().expect("fetch should succeed");
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].topic.as_deref(), Some("Arrays"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn file_source_reports_missing_file() {
        let source = FileSource::new("/definitely/not/here.json");
        assert!(matches!(source.fetch(), Err(FeedError::Io(_))));
    }
}
