//! Person identities and the viewer on whose behalf a call is made.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person known to this node, either local or discovered from a remote
/// node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
  /// Local row identifier.
  pub person_id:      Uuid,
  /// Globally unique id shared across the federation. Never changes.
  pub guid:           String,
  /// Local account name; `None` for remote persons.
  pub username:       Option<String>,
  /// Federated address `user@domain`, stored lowercased.
  pub handle:         String,
  pub display_name:   Option<String>,
  pub remote:         bool,
  pub closed_account: bool,
  /// Profile opt-in to free-text search.
  pub searchable:     bool,
  pub created_at:     DateTime<Utc>,
}

impl PersonRef {
  /// Display name if set, otherwise the handle.
  pub fn name(&self) -> &str {
    self.display_name.as_deref().unwrap_or(&self.handle)
  }
}

/// The signed-in local person making a request.
///
/// Threaded explicitly through every call as `Option<&Viewer>`; `None` is an
/// anonymous request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Viewer {
  pub person: PersonRef,
}

impl Viewer {
  pub fn new(person: PersonRef) -> Self { Self { person } }

  pub fn person_id(&self) -> Uuid { self.person.person_id }

  /// Whether `person` is the viewer's own identity.
  pub fn is(&self, person: &PersonRef) -> bool {
    self.person.person_id == person.person_id
  }
}

/// How a caller identifies the person to view: a guid, a username, or a
/// single value that may be either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonLookup {
  pub id:       Option<String>,
  pub username: Option<String>,
}

impl PersonLookup {
  pub fn guid(id: impl Into<String>) -> Self {
    Self { id: Some(id.into()), username: None }
  }

  pub fn username(username: impl Into<String>) -> Self {
    Self { id: None, username: Some(username.into()) }
  }

  /// A short description used in `NotFound` messages.
  pub fn describe(&self) -> String {
    match (&self.id, &self.username) {
      (Some(id), _) => format!("person {id}"),
      (None, Some(u)) => format!("user {u}"),
      (None, None) => "person (no id given)".to_owned(),
    }
  }
}

/// A person record produced by remote discovery, ready to be cached
/// locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPerson {
  pub guid:         String,
  pub handle:       String,
  pub display_name: Option<String>,
  pub profile_url:  Option<String>,
}
