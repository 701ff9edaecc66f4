use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use suraksha_core::ActorId;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{Comment, Patch, StoryError, StoryResult};

/// Opaque story identifier (UUID v4)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a client-supplied id; anything that is not a UUID is a validation error.
    pub fn parse(raw: &str) -> StoryResult<Self> {
        let raw = raw.trim();
        Uuid::parse_str(raw)
            .map(|id| Self(id.to_string()))
            .map_err(|_| StoryError::invalid_field("storyId", "storyId must be a valid story id"))
    }

    /// Wrap an id without validating it
    pub fn from_string(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Title, image, audio and duration.
///
/// Absent fields leave the stored value untouched when applied. Image and
/// audio may also be cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetadata {
    #[validate(length(min = 2, max = 50, message = "Title must be between 2 and 50 characters"))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    #[validate(custom(function = "image_reference"))]
    pub image: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    #[validate(custom(function = "audio_reference"))]
    pub audio: Patch<String>,
    #[validate(range(min = 0.0, message = "audioDuration must be a non-negative number of seconds"))]
    pub audio_duration: Option<f64>,
}

impl StoryMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.image.is_keep()
            && self.audio.is_keep()
            && self.audio_duration.is_none()
    }
}

fn image_reference(image: &Patch<String>) -> Result<(), ValidationError> {
    non_empty_reference(image, "Image reference must not be empty")
}

fn audio_reference(audio: &Patch<String>) -> Result<(), ValidationError> {
    non_empty_reference(audio, "Audio reference must not be empty")
}

fn non_empty_reference(patch: &Patch<String>, message: &'static str) -> Result<(), ValidationError> {
    match patch.value() {
        Some(reference) if reference.trim().is_empty() => {
            Err(ValidationError::new("length").with_message(Cow::Borrowed(message)))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub owner_id: ActorId,
    pub title: Option<String>,
    pub content: String,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub audio_duration: Option<f64>,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Oldest first
    #[serde(default, skip_serializing)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing)]
    pub liked_by: BTreeSet<ActorId>,
}

impl Story {
    /// An incomplete story holding the first fragment.
    pub fn draft(id: StoryId, owner_id: ActorId, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            title: None,
            content,
            image: None,
            audio: None,
            audio_duration: None,
            is_complete: false,
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
            liked_by: BTreeSet::new(),
        }
    }

    pub fn is_owned_by(&self, actor: &ActorId) -> bool {
        self.owner_id == *actor
    }

    /// Apply the fields present in `metadata`.
    ///
    /// Returns media URLs that were replaced or cleared and are no longer
    /// referenced. Clearing the audio also drops its duration unless a new
    /// one is given.
    pub fn apply_metadata(&mut self, metadata: &StoryMetadata) -> Vec<String> {
        let mut superseded = Vec::new();

        if let Some(title) = &metadata.title {
            self.title = Some(title.trim().to_string());
        }
        superseded.extend(patch_media(&mut self.image, &metadata.image));
        superseded.extend(patch_media(&mut self.audio, &metadata.audio));
        if metadata.audio == Patch::Clear {
            self.audio_duration = None;
        }
        if let Some(duration) = metadata.audio_duration {
            self.audio_duration = Some(duration);
        }

        superseded
    }

    /// Toggle `actor`'s like. Returns whether the story is now liked by them.
    pub fn toggle_like(&mut self, actor: &ActorId) -> bool {
        if self.liked_by.remove(actor) {
            false
        } else {
            self.liked_by.insert(actor.clone());
            true
        }
    }

    /// Every media URL the story references
    pub fn media_urls(&self) -> Vec<String> {
        self.image.iter().chain(self.audio.iter()).cloned().collect()
    }
}

fn patch_media(slot: &mut Option<String>, patch: &Patch<String>) -> Option<String> {
    match patch {
        Patch::Keep => None,
        Patch::Clear => slot.take(),
        Patch::Set(next) => match slot.replace(next.clone()) {
            Some(previous) if previous != *next => Some(previous),
            _ => None,
        },
    }
}
