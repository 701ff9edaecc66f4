use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Deserialize;
use suraksha_blob::PresignedUpload;
use suraksha_core::{AppError, Role};

use crate::error::map_json_rejection;
use crate::{Actor, ApiState, AxumError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub file_type: String,
}

pub fn upload_router() -> Router<ApiState> {
    Router::new().route("/uploads/presign", post(presign))
}

async fn presign(
    State(state): State<ApiState>,
    actor: Actor,
    body: Result<Json<PresignRequest>, JsonRejection>,
) -> Result<Json<PresignedUpload>, AxumError> {
    actor.require(&[Role::Student])?;
    let Json(request) = body.map_err(map_json_rejection)?;

    let media = state
        .stories
        .media()
        .ok_or_else(|| AppError::unavailable("Media uploads are not configured"))?;

    let upload = media.presign_upload(&request.file_type).await?;
    Ok(Json(upload))
}
