use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::{
    ChunkSession, Story, StoryError, StoryId, StoryPage, StoryQuery, StoryResult, StoryStore,
    StoryTx,
};

#[derive(Default)]
struct Tables {
    stories: HashMap<StoryId, Story>,
    sessions: HashMap<StoryId, ChunkSession>,
}

#[derive(Default)]
struct Inner {
    tables: RwLock<Tables>,
    locks: DashMap<StoryId, Arc<Mutex<()>>>,
    failing_commits: AtomicUsize,
}

/// In-process [`StoryStore`].
///
/// Each story has its own async mutex, so transactions on one story run one
/// after another while different stories proceed in parallel. Commits swap
/// the story and its session in under a single write lock. A story's mutex
/// is dropped from the lock map once no transaction holds or awaits it.
#[derive(Clone, Default)]
pub struct MemoryStoryStore {
    inner: Arc<Inner>,
}

impl MemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits fail with a persistence error.
    pub fn fail_next_commits(&self, count: usize) {
        self.inner.failing_commits.store(count, Ordering::SeqCst);
    }

    pub fn story_count(&self) -> usize {
        self.inner.tables.read().stories.len()
    }

    pub fn session_count(&self) -> usize {
        self.inner.tables.read().sessions.len()
    }

    /// Stories with a live lock entry
    pub fn lock_count(&self) -> usize {
        self.inner.locks.len()
    }

    fn lock_for(&self, story_id: &StoryId) -> Arc<Mutex<()>> {
        self.inner
            .locks
            .entry(story_id.clone())
            .or_default()
            .value()
            .clone()
    }
}

#[async_trait]
impl StoryStore for MemoryStoryStore {
    async fn begin(&self, story_id: &StoryId) -> StoryResult<Box<dyn StoryTx>> {
        let guard = self.lock_for(story_id).lock_owned().await;

        let (story, session) = {
            let tables = self.inner.tables.read();
            (
                tables.stories.get(story_id).cloned(),
                tables.sessions.get(story_id).cloned(),
            )
        };

        Ok(Box::new(MemoryTx {
            inner: self.inner.clone(),
            story_id: story_id.clone(),
            story,
            session,
            dirty: false,
            guard: Some(guard),
        }))
    }

    async fn story(&self, story_id: &StoryId) -> StoryResult<Option<Story>> {
        Ok(self.inner.tables.read().stories.get(story_id).cloned())
    }

    async fn session(&self, story_id: &StoryId) -> StoryResult<Option<ChunkSession>> {
        Ok(self.inner.tables.read().sessions.get(story_id).cloned())
    }

    async fn list(&self, query: &StoryQuery) -> StoryResult<StoryPage> {
        let mut matching: Vec<Story> = self
            .inner
            .tables
            .read()
            .stories
            .values()
            .filter(|story| query.matches(story))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(StoryPage { items, total })
    }
}

struct MemoryTx {
    inner: Arc<Inner>,
    story_id: StoryId,
    story: Option<Story>,
    session: Option<ChunkSession>,
    dirty: bool,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own handle left: nobody holds or waits for this story.
        self.inner
            .locks
            .remove_if(&self.story_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[async_trait]
impl StoryTx for MemoryTx {
    fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    fn session(&self) -> Option<&ChunkSession> {
        self.session.as_ref()
    }

    fn put_story(&mut self, story: Story) {
        self.story = Some(story);
        self.dirty = true;
    }

    fn put_session(&mut self, session: ChunkSession) {
        self.session = Some(session);
        self.dirty = true;
    }

    fn delete_session(&mut self) {
        self.session = None;
        self.dirty = true;
    }

    fn delete_story(&mut self) {
        self.story = None;
        self.session = None;
        self.dirty = true;
    }

    async fn commit(self: Box<Self>) -> StoryResult<()> {
        let mut tx = self;
        let failing = tx
            .inner
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoryError::persistence("commit rejected by store"));
        }

        if !tx.dirty {
            return Ok(());
        }

        let story_id = tx.story_id.clone();
        let (story, session) = (tx.story.take(), tx.session.take());
        {
            let mut tables = tx.inner.tables.write();
            match story {
                Some(story) => tables.stories.insert(story_id.clone(), story),
                None => tables.stories.remove(&story_id),
            };
            match session {
                Some(session) => tables.sessions.insert(story_id.clone(), session),
                None => tables.sessions.remove(&story_id),
            };
        }

        debug!(story_id = %story_id, "story transaction committed");
        Ok(())
    }
}
