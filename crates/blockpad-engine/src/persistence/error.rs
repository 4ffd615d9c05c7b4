/// Failure reported by the remote block store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Temporary failure: {0}")]
    Transient(String),
}

impl ApiError {
    /// Classify an HTTP-style status code
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => ApiError::Validation(message),
            401 | 403 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            413 => ApiError::PayloadTooLarge(message),
            _ => ApiError::Transient(message),
        }
    }

    /// Only transient failures (network, timeout, 5xx) are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }

    /// Message shown in the save indicator
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(_) => "Could not save: the change was rejected".to_string(),
            ApiError::NotFound(_) => "Could not save: the block no longer exists".to_string(),
            ApiError::Unauthorized(_) => {
                "Could not save: you do not have access to this document".to_string()
            }
            ApiError::PayloadTooLarge(_) => "Could not save: the content is too large".to_string(),
            ApiError::Transient(_) => {
                "Could not save: check your connection and try again".to_string()
            }
        }
    }
}
