use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures the request pipeline can surface, each mapped to an HTTP
/// status and a `{"error": message}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing request input
    #[error("{0}")]
    Validation(String),

    /// The upstream API was unreachable, returned a non-success status,
    /// or produced no usable content
    #[error("{0}")]
    Upstream(String),

    /// The model replied with text that does not parse into the expected
    /// result shape
    #[error("{0}")]
    MalformedResponse(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::MalformedResponse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
