#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Check-in failed: {0}")]
    CheckInFailed(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DomainError {
    /// Check if the error is recoverable by a later run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::CheckInFailed(_) | DomainError::Infrastructure(_)
        )
    }
}
