use thiserror::Error;

/// Error type for token operations.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("No token signing secret is configured")]
    MissingSecret,

    #[error("Token issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("Token rejected: {0}")]
    Invalid(String),
}
