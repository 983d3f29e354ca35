mod errors;
mod record;
mod source;

pub use errors::FeedError;
pub use record::{parse_feed, FeedBatch, FeedRecord};
pub use source::{FileSource, HttpSource, SheetSource};
