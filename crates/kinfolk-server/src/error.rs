//! Error types and axum `IntoResponse` implementation for the auth layer.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  /// The configured account has no person record.
  #[error("no local account named {0}")]
  AccountMissing(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"kinfolk\""),
        );
        res
      }
      Error::AccountMissing(_) | Error::Store(_) => {
        tracing::error!(error = %self, "cannot resolve signed-in viewer");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": self.to_string() })),
        )
          .into_response()
      }
    }
  }
}
