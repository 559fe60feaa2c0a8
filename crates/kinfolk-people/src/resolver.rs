//! Turning lookups and search queries into persons.

use std::sync::Arc;

use kinfolk_core::{
  Error, Result,
  federation::FederationClient,
  person::{PersonLookup, PersonRef, Viewer},
  query::{QueryKind, SearchQuery},
  store::IdentityStore,
};
use serde::Serialize;
use tracing::debug;

use crate::discovery::{DiscoveryOrigin, RemoteResolver};

/// Ordered search hits plus the handle of a discovery the search kicked
/// off, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
  pub people:            Vec<PersonRef>,
  pub kind:              QueryKind,
  /// Set when a handle-like query had no local match and a remote lookup
  /// is (or already was) in flight. Poll again later.
  pub pending_discovery: Option<String>,
}

impl SearchResults {
  fn empty(kind: QueryKind) -> Self {
    Self { people: Vec::new(), kind, pending_discovery: None }
  }

  pub fn len(&self) -> usize { self.people.len() }

  pub fn is_empty(&self) -> bool { self.people.is_empty() }
}

impl IntoIterator for SearchResults {
  type Item = PersonRef;
  type IntoIter = std::vec::IntoIter<PersonRef>;

  fn into_iter(self) -> Self::IntoIter { self.people.into_iter() }
}

/// Reject closed accounts.
pub fn ensure_open(person: PersonRef) -> Result<PersonRef> {
  if person.closed_account {
    return Err(Error::AccountClosed(person.handle));
  }
  Ok(person)
}

pub struct IdentityResolver<S, F> {
  store:  Arc<S>,
  remote: RemoteResolver<S, F>,
}

impl<S, F> IdentityResolver<S, F>
where
  S: IdentityStore + 'static,
  F: FederationClient + 'static,
{
  pub fn new(store: Arc<S>, remote: RemoteResolver<S, F>) -> Self {
    Self { store, remote }
  }

  /// Find a person by guid, then by username (or by `id` read as a
  /// username). Closed accounts are returned as-is; see
  /// [`IdentityResolver::resolve`].
  pub async fn find(&self, lookup: &PersonLookup) -> Result<PersonRef> {
    let id = lookup.id.as_deref().filter(|s| !s.is_empty());

    if let Some(guid) = id {
      let hit = self.store.find_by_guid(guid).await.map_err(Error::store)?;
      if let Some(person) = hit {
        debug!(guid, "resolved person by guid");
        return Ok(person);
      }
    }

    let username = lookup
      .username
      .as_deref()
      .filter(|s| !s.is_empty())
      .or(id);
    if let Some(username) = username {
      let hit = self
        .store
        .find_by_username(username)
        .await
        .map_err(Error::store)?;
      if let Some(person) = hit {
        debug!(username, "resolved person by username");
        return Ok(person);
      }
    }

    Err(Error::NotFound(lookup.describe()))
  }

  /// [`IdentityResolver::find`], failing with `AccountClosed` for a closed
  /// account. Never triggers remote discovery.
  pub async fn resolve(&self, lookup: &PersonLookup) -> Result<PersonRef> {
    ensure_open(self.find(lookup).await?)
  }

  /// Exact handle match first, then free-text hits.
  ///
  /// A handle-like query with no local match enqueues remote discovery and
  /// returns no people. `limit` bounds the whole result.
  pub async fn search(
    &self,
    query: &SearchQuery,
    viewer: Option<&Viewer>,
    limit: usize,
  ) -> Result<SearchResults> {
    let kind = query.kind();
    if query.is_blank() || limit == 0 {
      return Ok(SearchResults::empty(kind));
    }

    let mut people = Vec::new();
    if kind == QueryKind::HandleLike {
      let handle = query.normalized();
      match self.store.find_by_handle(&handle).await.map_err(Error::store)? {
        Some(person) if !person.closed_account => people.push(person),
        Some(_) => {}
        None => {
          self.remote.request_discovery(&handle, DiscoveryOrigin::Search);
          return Ok(SearchResults {
            people,
            kind,
            pending_discovery: Some(handle),
          });
        }
      }
    }

    let text = query.as_str().trim();
    let viewer_id = viewer.map(Viewer::person_id);
    let hits = self
      .store
      .search_people(text, viewer_id, limit)
      .await
      .map_err(Error::store)?;

    for hit in hits {
      if people.len() >= limit {
        break;
      }
      if !people.iter().any(|p| p.person_id == hit.person_id) {
        people.push(hit);
      }
    }

    debug!(query = text, ?kind, hits = people.len(), "search finished");
    Ok(SearchResults { people, kind, pending_discovery: None })
  }

  /// The local exact handle match for a handle-like query, if any. Never
  /// enqueues discovery.
  pub async fn exact_matches(&self, query: &SearchQuery) -> Result<Vec<PersonRef>> {
    if !query.is_handle_like() {
      return Ok(Vec::new());
    }
    let hit = self
      .store
      .find_by_handle(&query.normalized())
      .await
      .map_err(Error::store)?;
    Ok(hit.into_iter().filter(|p| !p.closed_account).collect())
  }
}
