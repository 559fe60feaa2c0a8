//! Photos and posts authored by a person.
//!
//! Both are shared either publicly or with a set of the author's aspects.
//! A viewer sees an item if it is public, if they wrote it, or if the
//! author placed them in one of the aspects it was shared with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  pub photo_id:   Uuid,
  pub author_id:  Uuid,
  pub url:        String,
  pub public:     bool,
  pub aspect_ids: Vec<Uuid>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    Uuid,
  pub author_id:  Uuid,
  pub text:       String,
  pub public:     bool,
  pub aspect_ids: Vec<Uuid>,
  pub created_at: DateTime<Utc>,
}
