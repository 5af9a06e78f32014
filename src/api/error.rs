use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::SearchError;

use super::models::ApiFailure;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Search(#[from] SearchError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Search(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.kind()),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, kind, "request failed");
        }
        (status, Json(ApiFailure::new(self.to_string(), kind))).into_response()
    }
}
