use std::collections::BTreeMap;

use serde_json::json;
use suraksha_core::AppError;
use thiserror::Error;

use crate::StoryId;

/// Result type for story operations
pub type StoryResult<T> = Result<T, StoryError>;

/// Field name → messages, in the order they were found.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors surfaced by story submission and reassembly
#[derive(Error, Debug)]
pub enum StoryError {
    /// Malformed or missing fields; raised before any persistence.
    #[error("Validation Error: {message}")]
    Validation { message: String, fields: FieldErrors },

    /// Story or session missing, or owned by someone else.
    #[error("Story not found: {id}")]
    NotFound { id: String },

    #[error("Story {story_id} is already complete")]
    SessionAlreadyComplete { story_id: StoryId },

    /// The client must resend starting from `expected`.
    #[error("Chunk {received_index} of story {story_id} arrived out of order (expected {expected})")]
    OutOfOrderChunk {
        story_id: StoryId,
        expected: u32,
        received_index: u32,
    },

    #[error("Story {story_id} has a chunked submission in progress ({received}/{total})")]
    SessionInProgress {
        story_id: StoryId,
        received: u32,
        total: u32,
    },

    /// Transaction or commit failure. Resubmitting the fragment is safe.
    #[error("Persistence failure: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoryError {
    /// Single-field validation error
    pub fn invalid_field<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        let mut fields = FieldErrors::new();
        let message = message.into();
        fields.insert(field.into(), vec![message.clone()]);
        Self::Validation { message, fields }
    }

    /// Validation error from collected field errors; `None` when empty.
    pub fn from_fields(fields: FieldErrors) -> Option<Self> {
        let message = fields.values().flatten().next()?.clone();
        Some(Self::Validation { message, fields })
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    pub fn persistence_from<E>(message: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Whether the client may resubmit the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    pub fn into_app_error(self) -> AppError {
        AppError::from(self)
    }
}

impl From<validator::ValidationErrors> for StoryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = fields.entry(camel_case(&field)).or_default();
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid ({})", err.code));
                messages.push(message);
            }
        }
        Self::from_fields(fields).unwrap_or_else(|| Self::invalid_field("_schema", "Invalid request"))
    }
}

/// `audio_duration` → `audioDuration`, matching the wire names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<StoryError> for AppError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::Validation { fields, .. } => {
                AppError::bad_request("Validation Error").with_errors(json!(fields))
            }
            StoryError::NotFound { .. } => AppError::not_found(
                "Story not found or you are not authorized to modify this story",
            ),
            StoryError::SessionAlreadyComplete { ref story_id } => {
                let data = json!({ "storyId": story_id });
                AppError::conflict(err.to_string()).with_data(data)
            }
            StoryError::OutOfOrderChunk {
                ref story_id,
                expected,
                received_index,
            } => {
                let data = json!({
                    "storyId": story_id,
                    "expectedChunkIndex": expected,
                    "chunkIndex": received_index,
                    "retryable": true,
                });
                AppError::conflict(err.to_string()).with_data(data)
            }
            StoryError::SessionInProgress {
                ref story_id,
                received,
                total,
            } => {
                let data = json!({
                    "storyId": story_id,
                    "chunksReceived": received,
                    "totalChunks": total,
                });
                AppError::conflict(err.to_string()).with_data(data)
            }
            StoryError::Persistence { ref message, .. } => {
                AppError::general_error(format!("Error while saving story: {message}"))
                    .with_data(json!({ "retryable": true }))
                    .with_source(anyhow::Error::new(err))
            }
        }
    }
}
