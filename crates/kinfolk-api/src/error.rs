//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  /// Distinct from `NotFound` so clients can tell a deactivated account
  /// from a missing one.
  #[error("account closed: {0}")]
  AccountClosed(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("authentication required")]
  Unauthenticated,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<kinfolk_core::Error> for ApiError {
  fn from(e: kinfolk_core::Error) -> Self {
    use kinfolk_core::Error as E;
    match e {
      E::NotFound(m) => Self::NotFound(m),
      E::AccountClosed(m) => Self::AccountClosed(m),
      E::Validation(m) => Self::Validation(m),
      E::Unauthenticated => Self::Unauthenticated,
      E::Store(e) => Self::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::AccountClosed(_) => (StatusCode::GONE, "account closed".to_owned()),
      ApiError::Validation(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Unauthenticated => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "authentication required" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"kinfolk\""),
        );
        return res;
      }
      ApiError::Store(e) => {
        error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
