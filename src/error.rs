//! HTTP-facing error type. Handlers return `Result<_, ApiError>` and the error
//! renders as `{"error": "..."}` with the matching status code.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::assessment::RunError;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
  #[error("{0}")]
  Gone(String),
  #[error("{0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Gone(_) => StatusCode::GONE,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match self {
      ApiError::Internal(msg) => {
        error!(target: "modlrn_backend", error = %msg, "Internal error");
        "Internal Server Error".to_string()
      }
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<RunError> for ApiError {
  fn from(err: RunError) -> Self {
    match err {
      RunError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
      RunError::Closed => ApiError::Gone(err.to_string()),
      RunError::NoQuestions => ApiError::Internal(err.to_string()),
    }
  }
}
