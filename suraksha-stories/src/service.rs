use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use suraksha_blob::MediaAdapter;
use suraksha_core::ActorId;
use tracing::info;

use crate::{
    ChunkProgress, Comment, CommentRequest, CommentView, LikeState, ReassemblyController, Route,
    SingleShot, Story, StoryError, StoryId, StoryQuery, StoryResult, StoryRules, StoryStore,
    StoryView, SubmissionRequest, UploadMode, UploadModeSelector,
};

/// Reply to a create or edit submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReply {
    pub story_id: StoryId,
    pub chunks_received: u32,
    pub total_chunks: u32,
    pub is_complete: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_chunk_index: Option<u32>,
    /// The story, once complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Story>,
}

impl SubmissionReply {
    fn single(story: Story, message: &str) -> Self {
        Self {
            story_id: story.id.clone(),
            chunks_received: 1,
            total_chunks: 1,
            is_complete: story.is_complete,
            message: message.to_string(),
            next_chunk_index: None,
            data: Some(story),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub page_size: usize,
    pub total_stories: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryListing {
    pub data: Vec<StoryView>,
    pub pagination: Pagination,
}

/// Entry point for every story operation.
///
/// Routes submissions through the [`UploadModeSelector`]; chunked ones go
/// to the [`ReassemblyController`], single-shot ones are handled here.
#[derive(Clone)]
pub struct StoryService {
    store: Arc<dyn StoryStore>,
    selector: UploadModeSelector,
    reassembly: ReassemblyController,
    media: Option<MediaAdapter>,
    rules: StoryRules,
}

impl StoryService {
    pub fn new(store: Arc<dyn StoryStore>, rules: StoryRules) -> Self {
        Self {
            selector: UploadModeSelector::new(rules.clone()),
            reassembly: ReassemblyController::new(store.clone(), rules.clone()),
            store,
            media: None,
            rules,
        }
    }

    pub fn with_media(mut self, media: MediaAdapter) -> Self {
        self.reassembly = self.reassembly.with_media(media.clone());
        self.media = Some(media);
        self
    }

    pub fn reassembly(&self) -> &ReassemblyController {
        &self.reassembly
    }

    pub fn rules(&self) -> &StoryRules {
        &self.rules
    }

    pub fn media(&self) -> Option<&MediaAdapter> {
        self.media.as_ref()
    }

    /// Validate `request`, pick its mode and apply it.
    pub async fn submit(
        &self,
        actor: &ActorId,
        route: Route,
        request: SubmissionRequest,
    ) -> StoryResult<SubmissionReply> {
        match self.selector.select(&route, request)? {
            UploadMode::Chunked(fragment) => {
                let receipt = self.reassembly.submit_fragment(actor, fragment).await?;
                let progress = receipt.progress;
                Ok(SubmissionReply {
                    story_id: progress.story_id,
                    chunks_received: progress.chunks_received,
                    total_chunks: progress.total_chunks,
                    is_complete: progress.is_complete,
                    message: receipt.outcome.message().to_string(),
                    next_chunk_index: progress.next_chunk_index,
                    data: progress.is_complete.then_some(receipt.story),
                })
            }
            UploadMode::SingleShot(single) => match route {
                Route::Create => {
                    let story = self.create_single(actor, single).await?;
                    Ok(SubmissionReply::single(story, "Story created successfully"))
                }
                Route::Edit(story_id) => {
                    let story = self.edit_single(actor, &story_id, single).await?;
                    Ok(SubmissionReply::single(story, "Story updated successfully"))
                }
            },
        }
    }

    /// Create a complete story from one request. No session is created.
    pub async fn create_single(&self, actor: &ActorId, single: SingleShot) -> StoryResult<Story> {
        let content = single
            .content
            .ok_or_else(|| StoryError::invalid_field("content", "content is required"))?;

        let story_id = StoryId::new();
        let mut tx = self.store.begin(&story_id).await?;

        let mut story = Story::draft(story_id.clone(), actor.clone(), content, Utc::now());
        story.apply_metadata(&single.metadata);
        story.is_complete = true;

        tx.put_story(story.clone());
        tx.commit().await?;

        info!(story_id = %story_id, actor_id = %actor, "story created");
        Ok(story)
    }

    /// Patch an owned story in place.
    ///
    /// Refused while a chunked upload is in progress. A finished session is
    /// dropped so it cannot disagree with the patched content.
    pub async fn edit_single(
        &self,
        actor: &ActorId,
        story_id: &StoryId,
        single: SingleShot,
    ) -> StoryResult<Story> {
        let mut tx = self.store.begin(story_id).await?;

        let Some(mut story) = tx.story().filter(|s| s.is_owned_by(actor)).cloned() else {
            return Err(StoryError::not_found(story_id.as_str()));
        };

        if let Some(session) = tx.session() {
            if session.state.is_in_progress() {
                return Err(StoryError::SessionInProgress {
                    story_id: story_id.clone(),
                    received: session.received_chunks(),
                    total: session.total_chunks(),
                });
            }
            tx.delete_session();
        }

        if let Some(content) = single.content {
            story.content = content;
        }
        let superseded = story.apply_metadata(&single.metadata);
        story.updated_at = Utc::now();

        tx.put_story(story.clone());
        tx.commit().await?;

        info!(story_id = %story_id, "story updated");
        self.reassembly.retire(superseded);
        Ok(story)
    }

    /// Remove an owned story and its session.
    pub async fn delete(&self, actor: &ActorId, story_id: &StoryId) -> StoryResult<Story> {
        let mut tx = self.store.begin(story_id).await?;

        let Some(story) = tx.story().filter(|s| s.is_owned_by(actor)).cloned() else {
            return Err(StoryError::not_found(story_id.as_str()));
        };

        tx.delete_story();
        tx.commit().await?;

        info!(story_id = %story_id, "story deleted");
        self.reassembly.retire(story.media_urls());
        Ok(story)
    }

    /// One story. Drafts are visible to their owner only.
    pub async fn get(&self, actor: &ActorId, story_id: &StoryId) -> StoryResult<StoryView> {
        self.store
            .story(story_id)
            .await?
            .filter(|story| visible_to(story, actor))
            .map(|story| StoryView::of(story, Utc::now()))
            .ok_or_else(|| StoryError::not_found(story_id.as_str()))
    }

    /// Comment on a story `actor` can see.
    pub async fn add_comment(
        &self,
        actor: &ActorId,
        story_id: &StoryId,
        request: CommentRequest,
    ) -> StoryResult<Comment> {
        let content = request.validate(&self.rules)?;
        let mut tx = self.store.begin(story_id).await?;

        let Some(mut story) = tx.story().filter(|s| visible_to(s, actor)).cloned() else {
            return Err(StoryError::not_found(story_id.as_str()));
        };

        let comment = Comment::new(actor.clone(), content, Utc::now());
        story.comments.push(comment.clone());
        tx.put_story(story);
        tx.commit().await?;

        info!(story_id = %story_id, actor_id = %actor, "comment added");
        Ok(comment)
    }

    /// Comments on a story, oldest first.
    pub async fn comments(&self, actor: &ActorId, story_id: &StoryId) -> StoryResult<Vec<CommentView>> {
        let story = self.get(actor, story_id).await?;
        Ok(story.comments)
    }

    /// Like a story `actor` can see, or take the like back.
    pub async fn toggle_like(&self, actor: &ActorId, story_id: &StoryId) -> StoryResult<LikeState> {
        let mut tx = self.store.begin(story_id).await?;

        let Some(mut story) = tx.story().filter(|s| visible_to(s, actor)).cloned() else {
            return Err(StoryError::not_found(story_id.as_str()));
        };

        let liked = story.toggle_like(actor);
        let like_count = story.liked_by.len();
        tx.put_story(story);
        tx.commit().await?;

        info!(story_id = %story_id, actor_id = %actor, liked, "like toggled");
        Ok(LikeState { liked, like_count })
    }

    /// Complete stories, newest first. `page` starts at 1.
    pub async fn list(&self, page: Option<usize>, limit: Option<usize>) -> StoryResult<StoryListing> {
        let page = page.unwrap_or(1).max(1);
        let page_size = limit
            .unwrap_or(self.rules.page_size_max)
            .clamp(1, self.rules.page_size_max);

        // Pages past the addressable range are simply empty.
        let offset = (page - 1).checked_mul(page_size).unwrap_or(usize::MAX);
        let query = StoryQuery::published().page(offset, page_size);
        let found = self.store.list(&query).await?;

        let now = Utc::now();
        let total_pages = found.total.div_ceil(page_size);
        Ok(StoryListing {
            data: found
                .items
                .into_iter()
                .map(|story| StoryView::of(story, now))
                .collect(),
            pagination: Pagination {
                current_page: page,
                page_size,
                total_stories: found.total,
                total_pages,
                has_next_page: page < total_pages,
                has_previous_page: page > 1,
            },
        })
    }

    /// Everything `actor` wrote, drafts included.
    pub async fn mine(&self, actor: &ActorId) -> StoryResult<Vec<StoryView>> {
        let found = self.store.list(&StoryQuery::owned_by(actor.clone())).await?;
        let now = Utc::now();
        Ok(found
            .items
            .into_iter()
            .map(|story| StoryView::of(story, now))
            .collect())
    }

    pub async fn progress(&self, actor: &ActorId, story_id: &StoryId) -> StoryResult<ChunkProgress> {
        self.reassembly.progress(actor, story_id).await
    }
}

fn visible_to(story: &Story, actor: &ActorId) -> bool {
    story.is_complete || story.is_owned_by(actor)
}
