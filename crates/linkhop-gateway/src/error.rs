use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linkhop_shortener::LinkError;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request body is not valid JSON")]
    InvalidJson,
    #[error("malformed link id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidJson => (StatusCode::BAD_REQUEST, "Invalid JSON").into_response(),
            AppError::InvalidId(_) => (StatusCode::BAD_REQUEST, "Invalid link id").into_response(),
            AppError::Link(LinkError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            AppError::Link(LinkError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Link not found").into_response()
            }
            AppError::Link(other) => {
                error!(error = %other, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
