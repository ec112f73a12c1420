use thiserror::Error;

/// Error for Document validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Document is empty")]
    Empty,

    #[error("Document too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for CustomerKind parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CustomerKindError {
    #[error("Unknown customer type: {0} (expected \"person\" or \"company\")")]
    Unknown(String),
}
