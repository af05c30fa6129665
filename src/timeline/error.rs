use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Failed to load segments: {0}")]
    Fetch(String),
}

impl From<chrono::ParseError> for TimelineError {
    fn from(e: chrono::ParseError) -> Self {
        TimelineError::InvalidData(format!("Malformed timestamp: {}", e))
    }
}
