use axum::{
    http,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Internal Server Error: {0}")]
    Internal(#[from] anyhow::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Not found")]
    NotFound,
    // Potentially more error types in the future
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::Internal(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Validation(_) => http::StatusCode::UNPROCESSABLE_ENTITY,
            WebError::Auth(_) => http::StatusCode::UNAUTHORIZED,
            WebError::NotFound => http::StatusCode::NOT_FOUND,
        };
        // Failures speak the same envelope as successes, just without data.
        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (status, body).into_response()
    }
}
