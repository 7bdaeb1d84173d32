//! The `{success, message, data}` envelope every successful response uses.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Reply<T> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  pub data:    T,
}

impl<T> Reply<T> {
  pub fn ok(data: T) -> Json<Self> {
    Json(Self {
      success: true,
      message: None,
      data,
    })
  }

  pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
    Json(Self {
      success: true,
      message: Some(message.into()),
      data,
    })
  }
}
