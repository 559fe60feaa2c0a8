//! Error types for `kinfolk-core`.
//!
//! These are the failures visible at the service boundary. Storage backends
//! keep their own error enums; services box them into [`Error::Store`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No local or previously-discovered record exists.
  #[error("not found: {0}")]
  NotFound(String),

  /// The identity exists but has been deactivated.
  #[error("account closed: {0}")]
  AccountClosed(String),

  #[error("validation failed: {0}")]
  Validation(String),

  /// The operation needs a signed-in viewer.
  #[error("authentication required")]
  Unauthenticated,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
