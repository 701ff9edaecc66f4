use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use suraksha_blob::MediaError;
use suraksha_core::AppError;
use suraksha_stories::StoryError;
use tracing::error;

#[derive(Debug)]
pub struct AxumError(pub anyhow::Error);

impl From<anyhow::Error> for AxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<AppError> for AxumError {
    fn from(e: AppError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<StoryError> for AxumError {
    fn from(e: StoryError) -> Self {
        AppError::from(e).into()
    }
}

impl From<MediaError> for AxumError {
    fn from(e: MediaError) -> Self {
        let app = match &e {
            MediaError::Invalid { message } => AppError::bad_request(message.clone())
                .with_errors(json!({ "fileType": [message] })),
            MediaError::NotFound { .. } => AppError::not_found(e.to_string()),
            MediaError::Unsupported | MediaError::Backend { .. } => {
                AppError::unavailable("Media storage is unavailable")
            }
        };
        app.with_source(anyhow::Error::new(e)).into()
    }
}

impl IntoResponse for AxumError {
    fn into_response(self) -> Response {
        // Structured errors keep their fields even when wrapped in context.
        let app = match AppError::find_in(&self.0) {
            Some(app) => app.sanitize_for_client(),
            None => AppError::general_error(self.0.to_string()),
        };

        if !app.kind.is_client_error() {
            error!(error = ?self.0, "request failed");
        }

        let status = StatusCode::from_u16(app.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(app.to_json())).into_response()
    }
}

pub(crate) fn map_json_rejection(rejection: JsonRejection) -> AxumError {
    AppError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({ "_schema": [rejection.body_text()] }))
        .into()
}

pub(crate) fn map_query_rejection(rejection: QueryRejection) -> AxumError {
    AppError::bad_request("Invalid query parameters")
        .with_errors(json!({ "_schema": [rejection.body_text()] }))
        .into()
}
