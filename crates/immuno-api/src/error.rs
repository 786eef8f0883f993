//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use immuno_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request conflicts with recorded state (e.g. a completed regimen).
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store error: refused doses and write-once conflicts keep
  /// their client status; everything else is a 500.
  pub fn store<E: StoreError>(e: E) -> Self {
    if let Some(rejection) = e.rejection() {
      Self::from_core(rejection)
    } else if e.is_conflict() {
      Self::Conflict(e.to_string())
    } else {
      Self::Store(Box::new(e))
    }
  }

  fn from_core(e: &immuno_core::Error) -> Self {
    use immuno_core::Error as Core;
    match e {
      Core::RegimenComplete { .. } => Self::Conflict(e.to_string()),
      Core::StockExpired { .. } => Self::Unprocessable(e.to_string()),
      Core::InvalidCatalogEntry(_)
      | Core::InvalidDoseRecord(_)
      | Core::Serialization(_) => Self::BadRequest(e.to_string()),
    }
  }
}

impl From<immuno_core::Error> for ApiError {
  fn from(e: immuno_core::Error) -> Self { Self::from_core(&e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
