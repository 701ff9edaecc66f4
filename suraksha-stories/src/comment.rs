use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use suraksha_core::ActorId;
use uuid::Uuid;

use crate::{StoryError, StoryResult, StoryRules};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_id: ActorId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: ActorId, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author_id,
            content,
            created_at: now,
        }
    }
}

/// Body of a comment submission, as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

impl CommentRequest {
    /// Trimmed comment text, bounded by `rules.max_comment_chars`.
    pub fn validate(self, rules: &StoryRules) -> StoryResult<String> {
        let text = self.comment.as_deref().map(str::trim).unwrap_or_default();
        let chars = text.chars().count();
        if chars == 0 || chars > rules.max_comment_chars {
            return Err(StoryError::invalid_field(
                "comment",
                format!(
                    "Comment must be between 1 and {} characters",
                    rules.max_comment_chars
                ),
            ));
        }
        Ok(text.to_string())
    }
}

/// Like state after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: usize,
}
