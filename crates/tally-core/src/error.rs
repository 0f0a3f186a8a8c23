use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Notification failed: {0}")]
    Notification(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// True for errors caused by caller input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::NotFound(_) | CoreError::PermissionDenied(_)
        )
    }
}
