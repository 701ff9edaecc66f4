use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StoryId;

/// Where a story stands in its chunked submission.
///
/// Stories without a session report `NotStarted`; persisted sessions are
/// always `InProgress` or `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ChunkState {
    NotStarted,
    InProgress { received: u32, total: u32 },
    Complete { total: u32 },
}

/// What applying a fragment to a [`ChunkState`] does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Index 0: start a sequence, replacing any previous one.
    Open,
    /// Already applied; nothing changes.
    Replay,
    Append { finalizes: bool },
}

/// Why a fragment cannot be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoSession,
    AlreadyComplete,
    TotalMismatch { declared: u32 },
    IndexOutOfBounds { total: u32 },
    Gap { expected: u32 },
}

impl ChunkState {
    pub fn of(session: Option<&ChunkSession>) -> Self {
        session.map(|s| s.state).unwrap_or(ChunkState::NotStarted)
    }

    /// State right after a sequence of `total` fragments is opened.
    pub fn opened(total: u32) -> Self {
        if total <= 1 {
            ChunkState::Complete { total: 1 }
        } else {
            ChunkState::InProgress { received: 1, total }
        }
    }

    pub fn received(&self) -> u32 {
        match *self {
            ChunkState::NotStarted => 0,
            ChunkState::InProgress { received, .. } => received,
            ChunkState::Complete { total } => total,
        }
    }

    pub fn total(&self) -> Option<u32> {
        match *self {
            ChunkState::NotStarted => None,
            ChunkState::InProgress { total, .. } | ChunkState::Complete { total } => Some(total),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ChunkState::Complete { .. })
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, ChunkState::InProgress { .. })
    }

    /// Index of the fragment the session is waiting for
    pub fn next_index(&self) -> Option<u32> {
        match *self {
            ChunkState::NotStarted => Some(0),
            ChunkState::InProgress { received, .. } => Some(received),
            ChunkState::Complete { .. } => None,
        }
    }

    /// Decide what a fragment `index` of `declared_total` does here.
    pub fn plan(&self, index: u32, declared_total: u32) -> Result<Transition, Rejection> {
        if index >= declared_total {
            return Err(Rejection::IndexOutOfBounds {
                total: declared_total,
            });
        }
        if index == 0 {
            return Ok(Transition::Open);
        }

        match *self {
            ChunkState::NotStarted => Err(Rejection::NoSession),
            ChunkState::Complete { .. } => Err(Rejection::AlreadyComplete),
            ChunkState::InProgress { received, total } => {
                if declared_total != total {
                    Err(Rejection::TotalMismatch { declared: total })
                } else if index < received {
                    Ok(Transition::Replay)
                } else if index == received {
                    Ok(Transition::Append {
                        finalizes: index + 1 == total,
                    })
                } else {
                    Err(Rejection::Gap { expected: received })
                }
            }
        }
    }

    /// State after appending the next fragment
    fn advanced(&self) -> Result<Self, Rejection> {
        match *self {
            ChunkState::InProgress { received, total } if received + 1 >= total => {
                Ok(ChunkState::Complete { total })
            }
            ChunkState::InProgress { received, total } => Ok(ChunkState::InProgress {
                received: received + 1,
                total,
            }),
            ChunkState::Complete { .. } => Err(Rejection::AlreadyComplete),
            ChunkState::NotStarted => Err(Rejection::NoSession),
        }
    }
}

/// Server-side record of an in-flight or finished chunked submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkSession {
    pub story_id: StoryId,
    pub state: ChunkState,
    /// Mirror of the story content assembled so far
    pub content: String,
    /// Byte length of the fragment that opened the sequence
    pub opening_len: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChunkSession {
    pub fn open(story_id: StoryId, total: u32, fragment: &str, now: DateTime<Utc>) -> Self {
        Self {
            story_id,
            state: ChunkState::opened(total),
            content: fragment.to_string(),
            opening_len: fragment.len(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Throw away the current sequence and start over with `fragment`.
    pub fn restart(&mut self, total: u32, fragment: &str, now: DateTime<Utc>) {
        self.state = ChunkState::opened(total);
        self.content = fragment.to_string();
        self.opening_len = fragment.len();
        self.updated_at = now;
    }

    pub fn append(&mut self, fragment: &str, now: DateTime<Utc>) -> Result<(), Rejection> {
        self.state = self.state.advanced()?;
        self.content.push_str(fragment);
        self.updated_at = now;
        Ok(())
    }

    /// An index-0 retransmission of the sequence already in progress.
    pub fn is_opening_replay(&self, total: u32, fragment: &str) -> bool {
        match self.state {
            ChunkState::InProgress { total: declared, .. } => {
                declared == total
                    && self.opening_len == fragment.len()
                    && self.content.starts_with(fragment)
            }
            _ => false,
        }
    }

    pub fn received_chunks(&self) -> u32 {
        self.state.received()
    }

    pub fn total_chunks(&self) -> u32 {
        self.state.total().unwrap_or(0)
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}
