//! Error type for `kinfolk-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("person not found: {0}")]
  PersonNotFound(String),

  /// A discovered person's guid is already taken by a different handle.
  #[error("guid {guid} already belongs to {existing}")]
  GuidConflict { guid: String, existing: String },

  /// An edge `owner → person` already exists.
  #[error("contact already exists: {owner_id} -> {person_id}")]
  DuplicateContact {
    owner_id:  uuid::Uuid,
    person_id: uuid::Uuid,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
