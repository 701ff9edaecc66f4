//! Ordered, idempotent reassembly of chunked story submissions.
//!
//! Each fragment is applied inside one store transaction holding the
//! story's lock, so a story and its session are always read, changed and
//! committed together:
//!
//! ```text
//! index == 0            → open (new story) or restart (existing story)
//! index <  received     → replay, nothing changes
//! index == received     → append; the last index finalizes
//! index >  received     → OutOfOrderChunk { expected: received }
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use suraksha_blob::MediaAdapter;
use suraksha_core::ActorId;
use tracing::{debug, info, warn};

use crate::session::{Rejection, Transition};
use crate::{
    ChunkSession, ChunkState, Fragment, Story, StoryError, StoryId, StoryResult, StoryRules,
    StoryStore, StoryTx,
};

/// What a fragment did to its story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentOutcome {
    /// A new draft story was created
    Started,
    /// An existing story's content was replaced by a new sequence
    Restarted,
    Appended,
    /// The terminal fragment was applied
    Finalized,
    /// Already applied earlier; nothing changed
    Replayed,
}

impl FragmentOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            FragmentOutcome::Started => "Story draft created",
            FragmentOutcome::Restarted => "Story edit restarted",
            FragmentOutcome::Appended => "Chunk received",
            FragmentOutcome::Finalized => "Story completed successfully",
            FragmentOutcome::Replayed => "Chunk already received",
        }
    }
}

/// Resumable view of a chunked submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkProgress {
    pub story_id: StoryId,
    pub chunks_received: u32,
    pub total_chunks: u32,
    pub is_complete: bool,
    /// The index the server expects next; `None` once complete
    pub next_chunk_index: Option<u32>,
}

impl ChunkProgress {
    pub fn of(story_id: StoryId, state: ChunkState) -> Self {
        Self {
            story_id,
            chunks_received: state.received(),
            total_chunks: state.total().unwrap_or(0),
            is_complete: state.is_complete(),
            next_chunk_index: state.next_index(),
        }
    }
}

/// Result of [`ReassemblyController::submit_fragment`]
#[derive(Debug, Clone)]
pub struct FragmentReceipt {
    pub outcome: FragmentOutcome,
    pub progress: ChunkProgress,
    pub story: Story,
}

#[derive(Clone)]
pub struct ReassemblyController {
    store: Arc<dyn StoryStore>,
    media: Option<MediaAdapter>,
    rules: StoryRules,
}

impl ReassemblyController {
    pub fn new(store: Arc<dyn StoryStore>, rules: StoryRules) -> Self {
        Self {
            store,
            media: None,
            rules,
        }
    }

    /// Retire superseded image/audio objects through `media`.
    pub fn with_media(mut self, media: MediaAdapter) -> Self {
        self.media = Some(media);
        self
    }

    /// Apply one fragment for `actor`.
    ///
    /// All writes of a fragment commit together or not at all; a failed
    /// commit can be retried with the same fragment.
    pub async fn submit_fragment(
        &self,
        actor: &ActorId,
        fragment: Fragment,
    ) -> StoryResult<FragmentReceipt> {
        match fragment.story_id.clone() {
            None if fragment.chunk_index == 0 => self.open(actor, fragment).await,
            None => Err(StoryError::invalid_field(
                "storyId",
                "storyId is required after the first chunk",
            )),
            Some(story_id) => self.advance(actor, story_id, fragment).await,
        }
    }

    /// Progress of the chunked submission behind `story_id`.
    pub async fn progress(&self, actor: &ActorId, story_id: &StoryId) -> StoryResult<ChunkProgress> {
        let owned = self
            .store
            .story(story_id)
            .await?
            .filter(|story| story.is_owned_by(actor));
        if owned.is_none() {
            return Err(StoryError::not_found(story_id.as_str()));
        }

        let session = self
            .store
            .session(story_id)
            .await?
            .ok_or_else(|| StoryError::not_found(story_id.as_str()))?;

        Ok(ChunkProgress::of(story_id.clone(), session.state))
    }

    async fn open(&self, actor: &ActorId, fragment: Fragment) -> StoryResult<FragmentReceipt> {
        let story_id = StoryId::new();
        let now = Utc::now();
        let tx = self.store.begin(&story_id).await?;

        let session = ChunkSession::open(story_id.clone(), fragment.total_chunks, &fragment.content, now);
        let mut story = Story::draft(story_id.clone(), actor.clone(), fragment.content.clone(), now);

        let mut outcome = FragmentOutcome::Started;
        let mut superseded = Vec::new();
        if session.is_complete() {
            superseded = finalize(&mut story, &fragment);
            outcome = FragmentOutcome::Finalized;
        }

        info!(
            story_id = %story_id,
            actor_id = %actor,
            total_chunks = fragment.total_chunks,
            "chunked story started"
        );
        self.commit(tx, story, session, outcome, superseded).await
    }

    async fn advance(
        &self,
        actor: &ActorId,
        story_id: StoryId,
        fragment: Fragment,
    ) -> StoryResult<FragmentReceipt> {
        let tx = self.store.begin(&story_id).await?;

        let Some(mut story) = tx.story().filter(|s| s.is_owned_by(actor)).cloned() else {
            return Err(StoryError::not_found(story_id.as_str()));
        };
        let session = tx.session().cloned();
        let state = ChunkState::of(session.as_ref());
        let now = Utc::now();

        let transition = state
            .plan(fragment.chunk_index, fragment.total_chunks)
            .map_err(|rejection| reject(&story_id, &fragment, rejection))?;

        let (session, outcome, superseded) = match transition {
            Transition::Replay => return Ok(replayed(story, state)),
            Transition::Open => match session {
                Some(existing)
                    if existing.is_opening_replay(fragment.total_chunks, &fragment.content) =>
                {
                    return Ok(replayed(story, existing.state));
                }
                previous => {
                    let mut session = previous.unwrap_or_else(|| {
                        ChunkSession::open(story_id.clone(), fragment.total_chunks, "", now)
                    });
                    session.restart(fragment.total_chunks, &fragment.content, now);

                    story.content = fragment.content.clone();
                    story.is_complete = false;
                    story.updated_at = now;

                    info!(
                        story_id = %story_id,
                        total_chunks = fragment.total_chunks,
                        "story edit restarted"
                    );

                    if session.is_complete() {
                        let superseded = finalize(&mut story, &fragment);
                        (session, FragmentOutcome::Finalized, superseded)
                    } else {
                        (session, FragmentOutcome::Restarted, Vec::new())
                    }
                }
            },
            Transition::Append { finalizes } => {
                let Some(mut session) = session else {
                    return Err(StoryError::not_found(story_id.as_str()));
                };

                let assembled = session.content.chars().count() + fragment.content.chars().count();
                if assembled > self.rules.max_content_chars {
                    return Err(StoryError::invalid_field(
                        "content",
                        format!(
                            "Story content may not exceed {} characters",
                            self.rules.max_content_chars
                        ),
                    ));
                }

                session
                    .append(&fragment.content, now)
                    .map_err(|rejection| reject(&story_id, &fragment, rejection))?;
                story.content.push_str(&fragment.content);
                story.updated_at = now;

                debug!(
                    story_id = %story_id,
                    chunk_index = fragment.chunk_index,
                    chunks_received = session.received_chunks(),
                    "chunk appended"
                );

                if finalizes {
                    let superseded = finalize(&mut story, &fragment);
                    (session, FragmentOutcome::Finalized, superseded)
                } else {
                    (session, FragmentOutcome::Appended, Vec::new())
                }
            }
        };

        self.commit(tx, story, session, outcome, superseded).await
    }

    /// Stage `story` and `session`, commit, then retire superseded media.
    async fn commit(
        &self,
        mut tx: Box<dyn StoryTx>,
        story: Story,
        session: ChunkSession,
        outcome: FragmentOutcome,
        superseded: Vec<String>,
    ) -> StoryResult<FragmentReceipt> {
        tx.put_story(story.clone());
        tx.put_session(session.clone());
        tx.commit().await?;

        if outcome == FragmentOutcome::Finalized {
            info!(story_id = %story.id, chunks = session.total_chunks(), "story finalized");
            self.retire(superseded);
        }

        Ok(FragmentReceipt {
            outcome,
            progress: ChunkProgress::of(story.id.clone(), session.state),
            story,
        })
    }

    pub(crate) fn retire(&self, urls: Vec<String>) {
        if let Some(media) = &self.media {
            media.retire(urls);
        }
    }
}

/// Mark `story` complete and apply the terminal fragment's metadata.
fn finalize(story: &mut Story, fragment: &Fragment) -> Vec<String> {
    story.is_complete = true;
    fragment
        .metadata
        .as_ref()
        .map(|metadata| story.apply_metadata(metadata))
        .unwrap_or_default()
}

fn replayed(story: Story, state: ChunkState) -> FragmentReceipt {
    debug!(story_id = %story.id, "duplicate chunk ignored");
    FragmentReceipt {
        outcome: FragmentOutcome::Replayed,
        progress: ChunkProgress::of(story.id.clone(), state),
        story,
    }
}

fn reject(story_id: &StoryId, fragment: &Fragment, rejection: Rejection) -> StoryError {
    let err = match rejection {
        Rejection::NoSession => StoryError::not_found(story_id.as_str()),
        Rejection::AlreadyComplete => StoryError::SessionAlreadyComplete {
            story_id: story_id.clone(),
        },
        Rejection::TotalMismatch { declared } => StoryError::invalid_field(
            "totalChunks",
            format!("totalChunks must stay {declared} for this upload"),
        ),
        Rejection::IndexOutOfBounds { .. } => {
            StoryError::invalid_field("chunkIndex", "chunkIndex must be less than totalChunks")
        }
        Rejection::Gap { expected } => StoryError::OutOfOrderChunk {
            story_id: story_id.clone(),
            expected,
            received_index: fragment.chunk_index,
        },
    };
    warn!(story_id = %story_id, chunk_index = fragment.chunk_index, error = %err, "chunk rejected");
    err
}
