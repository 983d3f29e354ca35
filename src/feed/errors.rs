use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum FeedError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Transport(String),
    Status(u16),
    InvalidShape(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Io(err) => write!(f, "I/O error: {}", err),
            FeedError::Json(err) => write!(f, "JSON parse error: {}", err),
            FeedError::Transport(message) => write!(f, "request failed: {}", message),
            FeedError::Status(code) => write!(f, "failed to fetch sheet: HTTP {}", code),
            FeedError::InvalidShape(message) => write!(f, "unexpected feed shape: {}", message),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FeedError::Io(err) => Some(err),
            FeedError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FeedError {
    fn from(value: std::io::Error) -> Self {
        FeedError::Io(value)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(value: serde_json::Error) -> Self {
        FeedError::Json(value)
    }
}

impl From<ureq::Error> for FeedError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::Status(code, _) => FeedError::Status(code),
            other => FeedError::Transport(other.to_string()),
        }
    }
}
