use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Value};
use suraksha_blob::{MediaAdapter, MediaConfig, MemoryMediaStore};
use suraksha_core::ActorId;
use suraksha_stories::{
    ChunkState, CommentRequest, FragmentOutcome, MemoryStoryStore, Patch, Route, StoryError,
    StoryId, StoryRules, StoryService, StoryStore, SubmissionReply, SubmissionRequest,
};

fn setup() -> (StoryService, MemoryStoryStore) {
    let store = MemoryStoryStore::new();
    let service = StoryService::new(Arc::new(store.clone()), StoryRules::default());
    (service, store)
}

fn body(value: Value) -> SubmissionRequest {
    serde_json::from_value(value).unwrap()
}

fn chunk(story_id: Option<&StoryId>, index: u32, total: u32, content: &str) -> SubmissionRequest {
    let mut value = json!({
        "isChunk": true,
        "chunkIndex": index,
        "totalChunks": total,
        "content": content,
    });
    if let Some(id) = story_id {
        value["storyId"] = json!(id.as_str());
    }
    body(value)
}

fn student() -> ActorId {
    ActorId::new("student-1")
}

async fn send(
    service: &StoryService,
    story_id: Option<&StoryId>,
    index: u32,
    total: u32,
    content: &str,
) -> Result<SubmissionReply, StoryError> {
    service
        .submit(&student(), Route::Create, chunk(story_id, index, total, content))
        .await
}

#[tokio::test]
async fn scenario_a_fragments_assemble_in_order() {
    let (service, store) = setup();

    let first = send(&service, None, 0, 3, "Once upon a ").await.unwrap();
    assert_eq!(first.chunks_received, 1);
    assert!(!first.is_complete);
    let id = first.story_id.clone();

    let second = send(&service, Some(&id), 1, 3, "time there was a ").await.unwrap();
    assert_eq!(second.chunks_received, 2);
    assert_eq!(second.next_chunk_index, Some(2));

    let mut last = chunk(Some(&id), 2, 3, "dragon.");
    last.title = Some("The Dragon".into());
    let done = service.submit(&student(), Route::Create, last).await.unwrap();
    assert!(done.is_complete);
    assert_eq!(done.message, "Story completed successfully");

    let story = store.story(&id).await.unwrap().unwrap();
    assert_eq!(story.content, "Once upon a time there was a dragon.");
    assert_eq!(story.title.as_deref(), Some("The Dragon"));
    assert!(story.is_complete);

    let session = store.session(&id).await.unwrap().unwrap();
    assert_eq!(session.state, ChunkState::Complete { total: 3 });
    assert_eq!(session.content, story.content);
}

#[tokio::test]
async fn scenario_b_replayed_fragment_changes_nothing() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 3, "Once upon a ").await.unwrap().story_id;
    send(&service, Some(&id), 1, 3, "time there was a ").await.unwrap();

    let replay = send(&service, Some(&id), 1, 3, "time there was a ").await.unwrap();
    assert_eq!(replay.chunks_received, 2);
    assert_eq!(replay.message, FragmentOutcome::Replayed.message());

    let story = store.story(&id).await.unwrap().unwrap();
    assert_eq!(story.content, "Once upon a time there was a ");
}

#[tokio::test]
async fn scenario_c_gap_is_rejected_without_mutation() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 3, "Once upon a ").await.unwrap().story_id;

    let err = send(&service, Some(&id), 2, 3, "dragon.").await.unwrap_err();
    assert!(matches!(
        err,
        StoryError::OutOfOrderChunk {
            expected: 1,
            received_index: 2,
            ..
        }
    ));

    let session = store.session(&id).await.unwrap().unwrap();
    assert_eq!(session.received_chunks(), 1);
    assert_eq!(store.story(&id).await.unwrap().unwrap().content, "Once upon a ");
}

#[tokio::test]
async fn scenario_d_single_fragment_edit_replaces_content() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 2, "Old ").await.unwrap().story_id;
    send(&service, Some(&id), 1, 2, "story").await.unwrap();

    let edit = service
        .submit(&student(), Route::Edit(id.clone()), chunk(None, 0, 1, "Brand new"))
        .await
        .unwrap();

    assert!(edit.is_complete);
    assert_eq!(edit.total_chunks, 1);
    let story = store.story(&id).await.unwrap().unwrap();
    assert_eq!(story.content, "Brand new");
    assert!(story.is_complete);
    assert_eq!(store.session_count(), 1);
}

#[tokio::test]
async fn completeness_holds_for_many_fragments() {
    let (service, store) = setup();
    let fragments: Vec<String> = (0..25).map(|i| format!("part-{i};")).collect();

    let id = send(&service, None, 0, 25, &fragments[0]).await.unwrap().story_id;
    for (index, fragment) in fragments.iter().enumerate().skip(1) {
        send(&service, Some(&id), index as u32, 25, fragment).await.unwrap();
    }

    let story = store.story(&id).await.unwrap().unwrap();
    assert_eq!(story.content, fragments.concat());
    assert!(story.is_complete);
}

#[tokio::test]
async fn completed_sessions_refuse_further_fragments() {
    let (service, _) = setup();
    let id = send(&service, None, 0, 2, "a").await.unwrap().story_id;
    send(&service, Some(&id), 1, 2, "b").await.unwrap();

    let err = send(&service, Some(&id), 1, 2, "b").await.unwrap_err();
    assert!(matches!(err, StoryError::SessionAlreadyComplete { .. }));
}

#[tokio::test]
async fn single_shot_stories_never_get_a_session() {
    let (service, store) = setup();

    let reply = service
        .submit(&student(), Route::Create, body(json!({ "content": "A whole story" })))
        .await
        .unwrap();
    assert!(reply.is_complete);

    assert!(store.session(&reply.story_id).await.unwrap().is_none());
    assert_eq!(store.session_count(), 0);

    let err = send(&service, Some(&reply.story_id), 1, 2, "more").await.unwrap_err();
    assert!(matches!(err, StoryError::NotFound { .. }));
}

#[tokio::test]
async fn other_actors_cannot_touch_a_story() {
    let (service, _) = setup();
    let id = send(&service, None, 0, 2, "mine ").await.unwrap().story_id;

    let err = service
        .submit(&ActorId::new("intruder"), Route::Create, chunk(Some(&id), 1, 2, "theirs"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::NotFound { .. }));
}

#[tokio::test]
async fn declared_total_cannot_change_mid_sequence() {
    let (service, _) = setup();
    let id = send(&service, None, 0, 3, "a").await.unwrap().story_id;

    let err = send(&service, Some(&id), 1, 4, "b").await.unwrap_err();
    assert!(matches!(err, StoryError::Validation { .. }));
}

#[tokio::test]
async fn opening_fragment_replay_on_edit_is_a_no_op() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 1, "Old").await.unwrap().story_id;

    let edit = || chunk(None, 0, 3, "New ");
    service.submit(&student(), Route::Edit(id.clone()), edit()).await.unwrap();
    send(&service, Some(&id), 1, 3, "beginning ").await.unwrap();

    let replay = service
        .submit(&student(), Route::Edit(id.clone()), edit())
        .await
        .unwrap();
    assert_eq!(replay.chunks_received, 2);
    assert_eq!(
        store.story(&id).await.unwrap().unwrap().content,
        "New beginning "
    );

    let restart = service
        .submit(&student(), Route::Edit(id.clone()), chunk(None, 0, 2, "Other "))
        .await
        .unwrap();
    assert_eq!(restart.chunks_received, 1);
    assert_eq!(store.story(&id).await.unwrap().unwrap().content, "Other ");
}

#[tokio::test]
async fn metadata_on_non_final_fragments_is_ignored() {
    let (service, store) = setup();
    let mut opening = chunk(None, 0, 2, "a");
    opening.title = Some("Too early".into());
    let id = service
        .submit(&student(), Route::Create, opening)
        .await
        .unwrap()
        .story_id;

    assert!(store.story(&id).await.unwrap().unwrap().title.is_none());

    send(&service, Some(&id), 1, 2, "b").await.unwrap();
    assert!(store.story(&id).await.unwrap().unwrap().title.is_none());
}

#[tokio::test]
async fn failed_commit_rolls_back_and_can_be_retried() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 2, "first ").await.unwrap().story_id;

    store.fail_next_commits(1);
    let err = send(&service, Some(&id), 1, 2, "second").await.unwrap_err();
    assert!(err.is_retryable());

    let session = store.session(&id).await.unwrap().unwrap();
    assert_eq!(session.received_chunks(), 1);
    assert_eq!(store.story(&id).await.unwrap().unwrap().content, "first ");

    let retried = send(&service, Some(&id), 1, 2, "second").await.unwrap();
    assert!(retried.is_complete);
    assert_eq!(store.story(&id).await.unwrap().unwrap().content, "first second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_deliveries_apply_once() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 3, "Once upon a ").await.unwrap().story_id;

    let deliveries = (0..16).map(|_| {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { send(&service, Some(&id), 1, 3, "time ").await })
    });
    let results = join_all(deliveries).await;

    let mut appended = 0;
    for result in results {
        let reply = result.unwrap().unwrap();
        assert_eq!(reply.chunks_received, 2);
        if reply.message == FragmentOutcome::Appended.message() {
            appended += 1;
        }
    }
    assert_eq!(appended, 1);

    let story = store.story(&id).await.unwrap().unwrap();
    assert_eq!(story.content, "Once upon a time ");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_edit_restarts_leave_one_consistent_sequence() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 1, "Done").await.unwrap().story_id;

    let restarts = ["alpha ", "beta ", "gamma "].map(|opening| {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move {
            service
                .submit(&student(), Route::Edit(id), chunk(None, 0, 2, opening))
                .await
        })
    });
    for result in join_all(restarts).await {
        result.unwrap().unwrap();
    }

    let story = store.story(&id).await.unwrap().unwrap();
    let session = store.session(&id).await.unwrap().unwrap();
    assert_eq!(story.content, session.content);
    assert!(["alpha ", "beta ", "gamma "].contains(&story.content.as_str()));
    assert_eq!(session.received_chunks(), 1);
    assert!(!story.is_complete);
}

#[tokio::test]
async fn single_shot_edit_waits_for_chunked_upload() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 2, "half").await.unwrap().story_id;

    let err = service
        .submit(&student(), Route::Edit(id.clone()), body(json!({ "title": "Renamed" })))
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::SessionInProgress { received: 1, total: 2, .. }));

    send(&service, Some(&id), 1, 2, " done").await.unwrap();
    let reply = service
        .submit(&student(), Route::Edit(id.clone()), body(json!({ "content": "Rewritten" })))
        .await
        .unwrap();
    assert_eq!(reply.data.unwrap().content, "Rewritten");
    assert!(store.session(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn progress_lets_a_client_resume() {
    let (service, _) = setup();
    let id = send(&service, None, 0, 4, "a").await.unwrap().story_id;
    send(&service, Some(&id), 1, 4, "b").await.unwrap();

    let progress = service.progress(&student(), &id).await.unwrap();
    assert_eq!(progress.chunks_received, 2);
    assert_eq!(progress.total_chunks, 4);
    assert_eq!(progress.next_chunk_index, Some(2));

    let err = service.progress(&ActorId::new("other"), &id).await.unwrap_err();
    assert!(matches!(err, StoryError::NotFound { .. }));
}

#[tokio::test]
async fn assembled_content_is_bounded() {
    let store = MemoryStoryStore::new();
    let service = StoryService::new(
        Arc::new(store.clone()),
        StoryRules {
            max_content_chars: 6,
            ..StoryRules::default()
        },
    );
    let id = send(&service, None, 0, 3, "abcd").await.unwrap().story_id;

    let err = send(&service, Some(&id), 1, 3, "efg").await.unwrap_err();
    assert!(matches!(err, StoryError::Validation { .. }));
    assert_eq!(store.session(&id).await.unwrap().unwrap().received_chunks(), 1);
}

#[tokio::test]
async fn finalization_retires_replaced_media() {
    let store = MemoryStoryStore::new();
    let blobs = MemoryMediaStore::new();
    let media = MediaAdapter::new(blobs.clone(), MediaConfig::default());
    let service =
        StoryService::new(Arc::new(store.clone()), StoryRules::default()).with_media(media.clone());

    let old = media.presign_upload("image/png").await.unwrap();
    let new = media.presign_upload("image/png").await.unwrap();

    let mut single = body(json!({ "content": "Picture story" }));
    single.image = Patch::Set(old.object_url.clone());
    let id = service
        .submit(&student(), Route::Create, single)
        .await
        .unwrap()
        .story_id;

    let mut edit = chunk(None, 0, 1, "Picture story, again");
    edit.image = Patch::Set(new.object_url.clone());
    service.submit(&student(), Route::Edit(id), edit).await.unwrap();

    for _ in 0..50 {
        if !blobs.deleted_keys().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(blobs.deleted_keys(), vec![old.key]);
    assert!(blobs.contains(&new.key));
}

#[tokio::test]
async fn single_shot_edit_clears_media_with_null() {
    let store = MemoryStoryStore::new();
    let blobs = MemoryMediaStore::new();
    let media = MediaAdapter::new(blobs.clone(), MediaConfig::default());
    let service =
        StoryService::new(Arc::new(store.clone()), StoryRules::default()).with_media(media.clone());

    let image = media.presign_upload("image/png").await.unwrap();
    let audio = media.presign_upload("audio/mpeg").await.unwrap();
    let id = service
        .submit(
            &student(),
            Route::Create,
            body(json!({
                "content": "Told aloud",
                "image": image.object_url,
                "audio": audio.object_url,
                "audioDuration": 30,
            })),
        )
        .await
        .unwrap()
        .story_id;

    let reply = service
        .submit(&student(), Route::Edit(id.clone()), body(json!({ "audio": null })))
        .await
        .unwrap();
    let story = reply.data.unwrap();
    assert_eq!(story.audio, None);
    assert_eq!(story.audio_duration, None);
    assert_eq!(story.image.as_deref(), Some(image.object_url.as_str()));

    for _ in 0..50 {
        if !blobs.deleted_keys().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(blobs.deleted_keys(), vec![audio.key]);
    assert!(blobs.contains(&image.key));
}

#[tokio::test]
async fn delete_removes_story_and_session() {
    let (service, store) = setup();
    let id = send(&service, None, 0, 2, "going").await.unwrap().story_id;

    let err = service.delete(&ActorId::new("other"), &id).await.unwrap_err();
    assert!(matches!(err, StoryError::NotFound { .. }));

    service.delete(&student(), &id).await.unwrap();
    assert_eq!(store.story_count(), 0);
    assert_eq!(store.session_count(), 0);
}

#[tokio::test]
async fn listing_pages_complete_stories_only() {
    let (service, _) = setup();
    for i in 0..12 {
        service
            .submit(&student(), Route::Create, body(json!({ "content": format!("story {i}") })))
            .await
            .unwrap();
    }
    send(&service, None, 0, 2, "draft").await.unwrap();

    let first = service.list(Some(1), Some(50)).await.unwrap();
    assert_eq!(first.data.len(), 10);
    assert_eq!(first.pagination.total_stories, 12);
    assert_eq!(first.pagination.total_pages, 2);
    assert!(first.pagination.has_next_page);
    assert!(!first.pagination.has_previous_page);

    let second = service.list(Some(2), None).await.unwrap();
    assert_eq!(second.data.len(), 2);
    assert!(!second.pagination.has_next_page);

    let mine = service.mine(&student()).await.unwrap();
    assert_eq!(mine.len(), 13);

    let beyond = service.list(Some(3), None).await.unwrap();
    assert!(beyond.data.is_empty());
    assert!(beyond.pagination.has_previous_page);
}

#[tokio::test]
async fn huge_page_numbers_yield_an_empty_page() {
    let (service, _) = setup();
    service
        .submit(&student(), Route::Create, body(json!({ "content": "only one" })))
        .await
        .unwrap();

    let listing = service.list(Some(usize::MAX), None).await.unwrap();
    assert!(listing.data.is_empty());
    assert_eq!(listing.pagination.current_page, usize::MAX);
    assert_eq!(listing.pagination.total_stories, 1);
    assert!(!listing.pagination.has_next_page);
}

#[tokio::test]
async fn drafts_are_private_to_their_owner() {
    let (service, _) = setup();
    let id = send(&service, None, 0, 2, "secret").await.unwrap().story_id;

    assert!(service.get(&student(), &id).await.is_ok());
    let err = service.get(&ActorId::new("parent-1"), &id).await.unwrap_err();
    assert!(matches!(err, StoryError::NotFound { .. }));
}

fn comment(text: &str) -> CommentRequest {
    CommentRequest {
        comment: Some(text.to_string()),
    }
}

#[tokio::test]
async fn comments_and_likes_show_up_in_the_listing() {
    let (service, _) = setup();
    let id = service
        .submit(&student(), Route::Create, body(json!({ "content": "Brave little fox" })))
        .await
        .unwrap()
        .story_id;
    let parent = ActorId::new("parent-1");

    service.add_comment(&student(), &id, comment("My first story")).await.unwrap();
    service.add_comment(&parent, &id, comment("  Proud of you  ")).await.unwrap();

    let liked = service.toggle_like(&parent, &id).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.like_count, 1);
    service.toggle_like(&student(), &id).await.unwrap();
    let unliked = service.toggle_like(&parent, &id).await.unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.like_count, 1);

    let listing = service.list(None, None).await.unwrap();
    let view = &listing.data[0];
    assert_eq!(view.comment_count, 2);
    assert_eq!(view.like_count, 1);
    assert_eq!(view.comments[1].comment.content, "Proud of you");
    assert_eq!(view.comments[1].comment.author_id, parent);
    assert_eq!(view.time_ago, "just now");

    let comments = service.comments(&parent, &id).await.unwrap();
    assert_eq!(comments.len(), 2);
}

#[tokio::test]
async fn drafts_take_no_comments_from_others() {
    let (service, _) = setup();
    let id = send(&service, None, 0, 2, "unfinished").await.unwrap().story_id;

    let err = service
        .add_comment(&ActorId::new("parent-1"), &id, comment("Hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::NotFound { .. }));

    let err = service.toggle_like(&ActorId::new("parent-1"), &id).await.unwrap_err();
    assert!(matches!(err, StoryError::NotFound { .. }));

    let err = service.add_comment(&student(), &id, comment("   ")).await.unwrap_err();
    assert!(matches!(err, StoryError::Validation { .. }));
}

#[tokio::test]
async fn comments_survive_an_edit_restart() {
    let (service, _) = setup();
    let id = send(&service, None, 0, 1, "Draft one").await.unwrap().story_id;
    service.add_comment(&student(), &id, comment("note")).await.unwrap();

    service
        .submit(&student(), Route::Edit(id.clone()), chunk(None, 0, 1, "Draft two"))
        .await
        .unwrap();

    let view = service.get(&student(), &id).await.unwrap();
    assert_eq!(view.story.content, "Draft two");
    assert_eq!(view.comment_count, 1);
}
