use thiserror::Error;

/// Failure taxonomy for backend operations. Validation failures are raised
/// before any network call; transport failures carry the HTTP library's
/// text; backend failures carry the message extracted from the response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ApiError {
    /// The bare message, without the variant prefix, for inline display.
    pub fn detail(&self) -> &str {
        match self {
            ApiError::Validation(message)
            | ApiError::Transport(message)
            | ApiError::Backend(message) => message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport(error.to_string())
    }
}
