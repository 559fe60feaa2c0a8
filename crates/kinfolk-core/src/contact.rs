//! Contact edges, aspects, and the derived view types built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::PersonRef;

/// A named group the owner sorts contacts into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspect {
  pub aspect_id:        Uuid,
  pub owner_id:         Uuid,
  pub name:             String,
  /// Whether members of this aspect may see its other members.
  pub contacts_visible: bool,
}

/// The directed relationship `owner → person`.
///
/// At most one edge exists per `(owner_id, person_id)`. No edge means the
/// two are strangers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEdge {
  pub contact_id: Uuid,
  pub owner_id:   Uuid,
  pub person_id:  Uuid,
  /// Aspects the owner placed the person in. Empty means "no aspect yet".
  pub aspect_ids: Vec<Uuid>,
  pub created_at: DateTime<Utc>,
}

impl ContactEdge {
  pub fn in_aspect(&self, aspect_id: Uuid) -> bool {
    self.aspect_ids.contains(&aspect_id)
  }
}

/// One of the viewer's aspects, flagged by whether a given person is in it.
/// Used for display only, never for authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AspectBinding {
  pub aspect_id: Uuid,
  pub name:      String,
  pub member:    bool,
}

/// A person paired with the viewer's edge to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonCard {
  pub person:  PersonRef,
  pub contact: Option<ContactEdge>,
}

/// The viewer's relationship to a person, as shown in the aspect dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AspectMembership {
  /// The person is the viewer; you are not a contact of yourself.
  ThatsYou,
  Contact {
    person:   PersonRef,
    contact:  Option<ContactEdge>,
    bindings: Vec<AspectBinding>,
  },
}
