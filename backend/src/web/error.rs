use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::repository::RepositoryError;

/// Error returned by every API handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct FieldMessage {
    field: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldMessage>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut fields = Vec::new();
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Repository(RepositoryError::Validation(validation)) => {
                fields = validation
                    .errors()
                    .iter()
                    .map(|e| FieldMessage {
                        field: e.field(),
                        message: e.to_string(),
                    })
                    .collect();
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid task input".to_string())
            }
            ApiError::Repository(RepositoryError::Unauthenticated) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Repository(RepositoryError::Forbidden) => {
                (StatusCode::FORBIDDEN, self.to_string())
            }
            ApiError::Repository(
                RepositoryError::NotFound(_) | RepositoryError::ProfileNotFound(_),
            ) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::Repository(RepositoryError::StoreUnavailable(e)) => {
                tracing::warn!(error = %e, "store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The task store is unavailable. Please try again later.".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                fields,
            }),
        )
            .into_response()
    }
}
