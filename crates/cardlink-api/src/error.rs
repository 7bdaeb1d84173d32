//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use cardlink_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a store (or core) error, keeping its category.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    Self::Store {
      kind:   e.kind(),
      source: Box::new(e),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::BadRequest(_) => ErrorKind::Validation,
      Self::Store { kind, .. } => *kind,
    }
  }
}

impl From<cardlink_core::Error> for ApiError {
  fn from(e: cardlink_core::Error) -> Self { Self::store(e) }
}

fn status_of(kind: ErrorKind) -> (StatusCode, &'static str) {
  match kind {
    ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation_error"),
    ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
    ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
    ErrorKind::PermissionDenied => (StatusCode::FORBIDDEN, "permission_denied"),
    ErrorKind::Fatal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, label) = status_of(self.kind());
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) => m.clone(),
      ApiError::Store { source, .. } => source.to_string(),
    };
    (
      status,
      Json(json!({ "success": false, "message": message, "error": label })),
    )
      .into_response()
  }
}
