use std::error::Error;
use std::fmt;

/// Structural misuse of the tree. Unknown ids are not errors; the store
/// ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::IndexOutOfRange { index, len } => write!(
                f,
                "reorder index {} is out of range for {} item(s)",
                index, len
            ),
        }
    }
}

impl Error for TreeError {}
