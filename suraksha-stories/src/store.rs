use async_trait::async_trait;
use serde::Serialize;
use suraksha_core::ActorId;

use crate::{ChunkSession, Story, StoryId, StoryResult};

/// Persistence for stories and their chunk sessions.
///
/// Every mutation goes through a [`StoryTx`], which holds the story's
/// exclusive lock from `begin` until it is committed or dropped.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Lock `story_id` and open a transaction over its story and session.
    ///
    /// Waits while another transaction holds the same story.
    async fn begin(&self, story_id: &StoryId) -> StoryResult<Box<dyn StoryTx>>;

    async fn story(&self, story_id: &StoryId) -> StoryResult<Option<Story>>;

    async fn session(&self, story_id: &StoryId) -> StoryResult<Option<ChunkSession>>;

    /// Stories matching `query`, newest first.
    async fn list(&self, query: &StoryQuery) -> StoryResult<StoryPage>;
}

/// Staged writes against one story.
///
/// Reads see the staged state. Dropping without [`StoryTx::commit`] discards
/// every write.
#[async_trait]
pub trait StoryTx: Send {
    fn story(&self) -> Option<&Story>;

    fn session(&self) -> Option<&ChunkSession>;

    fn put_story(&mut self, story: Story);

    fn put_session(&mut self, session: ChunkSession);

    fn delete_session(&mut self);

    /// Removes the story and its session.
    fn delete_story(&mut self);

    async fn commit(self: Box<Self>) -> StoryResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryQuery {
    /// Restrict to one owner
    pub owner: Option<ActorId>,
    /// Include incomplete stories
    pub include_drafts: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl StoryQuery {
    /// Complete stories of every owner
    pub fn published() -> Self {
        Self::default()
    }

    /// Everything `owner` wrote, drafts included
    pub fn owned_by(owner: ActorId) -> Self {
        Self {
            owner: Some(owner),
            include_drafts: true,
            ..Self::default()
        }
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, story: &Story) -> bool {
        (self.include_drafts || story.is_complete)
            && self.owner.as_ref().map_or(true, |owner| story.is_owned_by(owner))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoryPage {
    pub items: Vec<Story>,
    /// Matches before paging
    pub total: usize,
}
