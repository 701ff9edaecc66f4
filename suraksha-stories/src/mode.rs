//! Choosing between single-shot and chunked submission.
//!
//! Form-encoded clients send every field as a string, so `isChunk`,
//! `chunkIndex` and `totalChunks` are accepted as JSON numbers, booleans
//! or their string forms.

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::{FieldErrors, Patch, StoryError, StoryId, StoryMetadata, StoryResult, StoryRules};

/// Body of a create or edit request, as received.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default)]
    pub is_chunk: Option<Value>,
    #[serde(default)]
    pub chunk_index: Option<Value>,
    #[serde(default)]
    pub total_chunks: Option<Value>,
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// `null` removes the current image
    #[serde(default)]
    pub image: Patch<String>,
    /// `null` removes the current audio
    #[serde(default)]
    pub audio: Patch<String>,
    #[serde(default)]
    pub audio_duration: Option<Value>,
}

/// Which endpoint a submission arrived on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Create,
    Edit(StoryId),
}

/// Whole content in one request; no chunk session involved.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleShot {
    /// Required when creating, optional for an edit.
    pub content: Option<String>,
    pub metadata: StoryMetadata,
}

/// One validated fragment of a chunked submission
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// `None` only for the opening fragment of a new story.
    pub story_id: Option<StoryId>,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub content: String,
    /// Present only on the terminal fragment
    pub metadata: Option<StoryMetadata>,
}

impl Fragment {
    pub fn is_terminal(&self) -> bool {
        self.chunk_index + 1 == self.total_chunks
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadMode {
    SingleShot(SingleShot),
    Chunked(Fragment),
}

/// Validates a [`SubmissionRequest`] and picks its [`UploadMode`].
///
/// Every problem is collected so the client sees all failing fields at once.
#[derive(Debug, Clone, Default)]
pub struct UploadModeSelector {
    rules: StoryRules,
}

impl UploadModeSelector {
    pub fn new(rules: StoryRules) -> Self {
        Self { rules }
    }

    pub fn select(&self, route: &Route, request: SubmissionRequest) -> StoryResult<UploadMode> {
        let mut errors = FieldErrors::new();
        let chunked = parse_flag(request.is_chunk.as_ref()).unwrap_or_else(|message| {
            push(&mut errors, "isChunk", message);
            false
        });

        if !errors.is_empty() {
            return Err(reject(errors));
        }

        if chunked {
            self.select_chunked(route, request, errors)
                .map(UploadMode::Chunked)
        } else {
            self.select_single(route, request, errors)
                .map(UploadMode::SingleShot)
        }
    }

    fn select_single(
        &self,
        route: &Route,
        request: SubmissionRequest,
        mut errors: FieldErrors,
    ) -> StoryResult<SingleShot> {
        let metadata = metadata_of(&request, &mut errors);

        match (&request.content, route) {
            (None, Route::Create) => push(&mut errors, "content", "content is required"),
            (Some(content), _) => {
                let chars = content.trim().chars().count();
                if chars == 0 || chars > self.rules.max_single_shot_chars {
                    push(
                        &mut errors,
                        "content",
                        format!(
                            "Content must be between 1 and {} characters",
                            self.rules.max_single_shot_chars
                        ),
                    );
                }
            }
            (None, Route::Edit(_)) => {
                if metadata.is_empty() && errors.is_empty() {
                    push(&mut errors, "_schema", "No update fields provided");
                }
            }
        }

        if !errors.is_empty() {
            return Err(reject(errors));
        }

        Ok(SingleShot {
            content: request.content.map(|c| c.trim().to_string()),
            metadata,
        })
    }

    fn select_chunked(
        &self,
        route: &Route,
        request: SubmissionRequest,
        mut errors: FieldErrors,
    ) -> StoryResult<Fragment> {
        let chunk_index = match parse_count(request.chunk_index.as_ref(), "chunkIndex") {
            Ok(Some(index)) => Some(index),
            Ok(None) => {
                push(&mut errors, "chunkIndex", "chunkIndex is required for chunked uploads");
                None
            }
            Err(message) => {
                push(&mut errors, "chunkIndex", message);
                None
            }
        };

        let total_chunks = match parse_count(request.total_chunks.as_ref(), "totalChunks") {
            Ok(Some(0)) => {
                push(&mut errors, "totalChunks", "totalChunks must be >= 1");
                None
            }
            Ok(Some(total)) if total > self.rules.max_total_chunks => {
                push(
                    &mut errors,
                    "totalChunks",
                    format!("totalChunks must be <= {}", self.rules.max_total_chunks),
                );
                None
            }
            Ok(Some(total)) => Some(total),
            Ok(None) => {
                push(&mut errors, "totalChunks", "totalChunks is required for chunked uploads");
                None
            }
            Err(message) => {
                push(&mut errors, "totalChunks", message);
                None
            }
        };

        if let (Some(index), Some(total)) = (chunk_index, total_chunks) {
            if index >= total {
                push(&mut errors, "chunkIndex", "chunkIndex must be less than totalChunks");
            }
        }

        match request.content.as_deref() {
            None => push(&mut errors, "content", "content is required"),
            Some("") => push(&mut errors, "content", "content must not be empty"),
            Some(fragment) if fragment.chars().count() > self.rules.max_fragment_chars => push(
                &mut errors,
                "content",
                format!(
                    "A chunk may hold at most {} characters",
                    self.rules.max_fragment_chars
                ),
            ),
            Some(_) => {}
        }

        let story_id = match route {
            Route::Edit(id) => Some(id.clone()),
            Route::Create if chunk_index == Some(0) => None,
            Route::Create => match request.story_id.as_deref() {
                Some(raw) => match StoryId::parse(raw) {
                    Ok(id) => Some(id),
                    Err(_) => {
                        push(&mut errors, "storyId", "storyId must be a valid story id");
                        None
                    }
                },
                None => {
                    if chunk_index.is_some() {
                        push(&mut errors, "storyId", "storyId is required after the first chunk");
                    }
                    None
                }
            },
        };

        // Metadata only counts on the terminal fragment.
        let terminal = matches!(
            (chunk_index, total_chunks),
            (Some(index), Some(total)) if index + 1 == total
        );
        let metadata = terminal.then(|| metadata_of(&request, &mut errors));

        match (chunk_index, total_chunks, request.content) {
            (Some(chunk_index), Some(total_chunks), Some(content)) if errors.is_empty() => {
                Ok(Fragment {
                    story_id,
                    chunk_index,
                    total_chunks,
                    content,
                    metadata,
                })
            }
            _ => Err(reject(errors)),
        }
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

fn reject(errors: FieldErrors) -> StoryError {
    StoryError::from_fields(errors)
        .unwrap_or_else(|| StoryError::invalid_field("_schema", "Invalid request"))
}

fn metadata_of(request: &SubmissionRequest, errors: &mut FieldErrors) -> StoryMetadata {
    let audio_duration = match parse_number(request.audio_duration.as_ref()) {
        Ok(duration) => duration,
        Err(message) => {
            push(errors, "audioDuration", message);
            None
        }
    };

    let metadata = StoryMetadata {
        title: request.title.clone(),
        image: request.image.clone(),
        audio: request.audio.clone(),
        audio_duration,
    };

    if let Err(invalid) = metadata.validate() {
        if let StoryError::Validation { fields, .. } = StoryError::from(invalid) {
            for (field, messages) in fields {
                errors.entry(field).or_default().extend(messages);
            }
        }
    }

    metadata
}

fn parse_flag(value: Option<&Value>) -> Result<bool, String> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::Number(n)) if n.as_u64() == Some(0) => Ok(false),
        Some(Value::Number(n)) if n.as_u64() == Some(1) => Ok(true),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "0" => Ok(false),
            "true" | "1" => Ok(true),
            _ => Err("isChunk must be a boolean".to_string()),
        },
        Some(_) => Err("isChunk must be a boolean".to_string()),
    }
}

fn parse_count(value: Option<&Value>, field: &str) -> Result<Option<u32>, String> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(n) => n,
            None => return Err(format!("{field} must be an integer")),
        },
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("{field} must be an integer"))?,
        Some(_) => return Err(format!("{field} must be an integer")),
    };

    if parsed < 0 {
        return Err(format!("{field} must be >= 0"));
    }
    u32::try_from(parsed)
        .map(Some)
        .map_err(|_| format!("{field} is too large"))
}

fn parse_number(value: Option<&Value>) -> Result<Option<f64>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| "audioDuration must be a number".to_string()),
        Some(_) => Err("audioDuration must be a number".to_string()),
    }
}
