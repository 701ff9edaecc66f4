use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use suraksha_core::Role;
use suraksha_stories::{CommentRequest, Route, StoryId, SubmissionRequest};

use crate::error::{map_json_rejection, map_query_rejection};
use crate::{Actor, ApiState, AxumError};

const WRITERS: &[Role] = &[Role::Student];
const READERS: &[Role] = &[Role::Student, Role::Parent, Role::Therapist];
const LIKERS: &[Role] = &[Role::Student, Role::Parent];

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

pub fn story_router() -> Router<ApiState> {
    Router::new()
        .route("/stories", post(create_story).get(list_stories))
        .route("/stories/mine", get(my_stories))
        .route(
            "/stories/{id}",
            get(get_story).put(edit_story).delete(delete_story),
        )
        .route("/stories/{id}/progress", get(story_progress))
        .route(
            "/stories/{id}/comments",
            post(add_comment).get(list_comments),
        )
        .route("/stories/{id}/like", post(toggle_like))
}

fn story_id(raw: &str) -> Result<StoryId, AxumError> {
    Ok(StoryId::parse(raw)?)
}

async fn create_story(
    State(state): State<ApiState>,
    actor: Actor,
    body: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(WRITERS)?;
    let Json(request) = body.map_err(map_json_rejection)?;

    let reply = state
        .stories
        .submit(&actor.actor_id, Route::Create, request)
        .await?;

    // A new story exists after every single-shot create or opening fragment.
    let status = if reply.chunks_received == 1 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(reply)))
}

async fn edit_story(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(WRITERS)?;
    let id = story_id(&id)?;
    let Json(request) = body.map_err(map_json_rejection)?;

    let reply = state
        .stories
        .submit(&actor.actor_id, Route::Edit(id), request)
        .await?;
    Ok(Json(reply))
}

async fn delete_story(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(WRITERS)?;
    let id = story_id(&id)?;

    let story = state.stories.delete(&actor.actor_id, &id).await?;
    Ok(Json(json!({
        "message": "Story deleted successfully",
        "data": story,
    })))
}

async fn list_stories(
    State(state): State<ApiState>,
    actor: Actor,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AxumError> {
    actor.require(READERS)?;
    let Query(params) = params.map_err(map_query_rejection)?;

    let listing = state.stories.list(params.page, params.limit).await?;
    Ok(Json(listing))
}

async fn my_stories(
    State(state): State<ApiState>,
    actor: Actor,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(READERS)?;
    let stories = state.stories.mine(&actor.actor_id).await?;
    Ok(Json(json!({ "data": stories })))
}

async fn get_story(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(READERS)?;
    let id = story_id(&id)?;

    let story = state.stories.get(&actor.actor_id, &id).await?;
    Ok(Json(json!({ "data": story })))
}

async fn story_progress(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(WRITERS)?;
    let id = story_id(&id)?;

    let progress = state.stories.progress(&actor.actor_id, &id).await?;
    Ok(Json(progress))
}

async fn add_comment(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(WRITERS)?;
    let id = story_id(&id)?;
    let Json(request) = body.map_err(map_json_rejection)?;

    let comment = state.stories.add_comment(&actor.actor_id, &id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment added successfully",
            "data": comment,
        })),
    ))
}

async fn list_comments(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(READERS)?;
    let id = story_id(&id)?;

    let comments = state.stories.comments(&actor.actor_id, &id).await?;
    Ok(Json(json!({ "data": comments })))
}

async fn toggle_like(
    State(state): State<ApiState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AxumError> {
    let actor = actor.require(LIKERS)?;
    let id = story_id(&id)?;

    let like = state.stories.toggle_like(&actor.actor_id, &id).await?;
    Ok(Json(like))
}
