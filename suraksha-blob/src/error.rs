use thiserror::Error;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while talking to media storage
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media object not found: {key}")]
    NotFound { key: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Operation not supported by this store")]
    Unsupported,

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MediaError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }
}

/// A superseded media object that could not be removed.
///
/// Never fails the request that triggered the cleanup; it is only logged
/// and reported back to callers that asked for the outcome.
#[derive(Error, Debug)]
#[error("Failed to clean up superseded media {url}: {error}")]
pub struct StorageCleanupError {
    pub url: String,
    #[source]
    pub error: MediaError,
}
