use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `target_type` of notifications about a person (e.g. "started sharing
/// with you").
pub const PERSON_TARGET: &str = "Person";

/// A notification delivered to a local recipient. Only ever flipped from
/// unread to read here, never created or destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
  pub notification_id: Uuid,
  pub recipient_id:    Uuid,
  pub target_type:     String,
  pub target_id:       Uuid,
  pub unread:          bool,
}
