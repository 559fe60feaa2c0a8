//! Storage traits consumed by the resolution services.
//!
//! Each trait covers one collaborator: identities, the contact graph,
//! photos, posts and notifications. Backends (e.g. `kinfolk-store-sqlite`)
//! usually implement all of them on one type; [`Store`] names that bundle.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  contact::{Aspect, ContactEdge},
  media::{Photo, Post},
  notification::NotificationRecord,
  page::Page,
  person::{DiscoveredPerson, PersonRef},
};

// ─── Identities ──────────────────────────────────────────────────────────────

/// Lookup of persons by their identifying keys.
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn find_by_guid<'a>(
    &'a self,
    guid: &'a str,
  ) -> impl Future<Output = Result<Option<PersonRef>, Self::Error>> + Send + 'a;

  /// Local accounts only; remote persons have no username.
  fn find_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<PersonRef>, Self::Error>> + Send + 'a;

  /// Case-insensitive exact handle match.
  fn find_by_handle<'a>(
    &'a self,
    handle: &'a str,
  ) -> impl Future<Output = Result<Option<PersonRef>, Self::Error>> + Send + 'a;

  /// Free-text search over open accounts that are searchable or are
  /// contacts of `viewer_id`, ranked by relevance (prefix before
  /// substring), ties by creation time ascending.
  fn search_people<'a>(
    &'a self,
    text: &'a str,
    viewer_id: Option<Uuid>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<PersonRef>, Self::Error>> + Send + 'a;

  /// Cache a remotely discovered person, inserting or refreshing the row
  /// keyed by handle.
  fn record_discovered(
    &self,
    person: DiscoveredPerson,
  ) -> impl Future<Output = Result<PersonRef, Self::Error>> + Send + '_;
}

// ─── Contact graph ───────────────────────────────────────────────────────────

pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The edge `owner_id → person_id`, if any.
  fn edge_for(
    &self,
    owner_id: Uuid,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Option<ContactEdge>, Self::Error>> + Send + '_;

  /// Every edge from `owner_id` to any of `person_ids`.
  fn edges_for<'a>(
    &'a self,
    owner_id: Uuid,
    person_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<ContactEdge>, Self::Error>> + Send + 'a;

  /// All persons `owner_id` has an edge to, ordered by person creation
  /// time.
  fn contacts_of(
    &self,
    owner_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<PersonRef>, Self::Error>> + Send + '_;

  fn count_contacts_of(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// The contacts `owner_id` exposes to `viewer_id`: members of the owner's
  /// `contacts_visible` aspects that contain the viewer, excluding the
  /// viewer. Same ordering as [`ContactStore::contacts_of`].
  fn shared_contacts_of(
    &self,
    owner_id: Uuid,
    viewer_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<PersonRef>, Self::Error>> + Send + '_;

  fn count_shared_contacts_of(
    &self,
    owner_id: Uuid,
    viewer_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn aspects_of(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Aspect>, Self::Error>> + Send + '_;
}

// ─── Media ───────────────────────────────────────────────────────────────────

pub trait PhotoStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Photos by `author_id` visible to `viewer_id`, newest first. With no
  /// viewer only public photos are returned.
  fn photos_for(
    &self,
    author_id: Uuid,
    viewer_id: Option<Uuid>,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Photo>, Self::Error>> + Send + '_;

  fn count_photos_for(
    &self,
    author_id: Uuid,
    viewer_id: Option<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

pub trait PostStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Posts by `author_id` visible to `viewer_id` created strictly before
  /// `before` (if given), newest first.
  fn visible_posts_for(
    &self,
    author_id: Uuid,
    viewer_id: Option<Uuid>,
    before: Option<DateTime<Utc>>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub trait NotificationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn find_unread<'a>(
    &'a self,
    recipient_id: Uuid,
    target_type: &'a str,
    target_id: Uuid,
  ) -> impl Future<Output = Result<Vec<NotificationRecord>, Self::Error>>
  + Send
  + 'a;

  /// Unconditionally mark a notification read. Marking an already-read
  /// notification is not an error.
  fn mark_read(
    &self,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Everything the people services read from.
pub trait Store:
  IdentityStore + ContactStore + PhotoStore + PostStore + NotificationStore
{
}

impl<T> Store for T where
  T: IdentityStore + ContactStore + PhotoStore + PostStore + NotificationStore
{
}
