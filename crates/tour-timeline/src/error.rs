//! Error types for tour-timeline operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelineError {
    /// A precondition was violated: inverted interval, unsorted versions,
    /// an out-of-range rule parameter, or a missing tour / tour version.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A planning document could not be parsed.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl TimelineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TimelineError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;
