//! The people operations exposed over HTTP, composed from the resolution
//! components.
//!
//! Every operation takes the viewer explicitly. Operations that need one
//! take `&Viewer`; the rest take `Option<&Viewer>` and treat `None` as an
//! anonymous request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kinfolk_core::{
  Error, Result,
  contact::{AspectMembership, ContactEdge, PersonCard},
  federation::FederationClient,
  media::Post,
  page::{Page, Paginated},
  person::{PersonLookup, PersonRef, Viewer},
  query::{SearchQuery, is_handle_like},
  store::Store,
};
use serde::Serialize;
use tracing::debug;

use crate::{
  discovery::{DiscoveryOrigin, DiscoveryRequest, RemoteResolver},
  notifications::NotificationSweeper,
  profile::{AggregateComposer, ProfileAggregate},
  resolver::{IdentityResolver, ensure_open},
  settings::{DiscoverySettings, PeopleSettings},
  visibility::VisibilityGraph,
};

// ─── Response shapes ─────────────────────────────────────────────────────────

/// A page of search hits paired with the viewer's edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
  pub people:            Vec<PersonCard>,
  pub page:              u32,
  pub per_page:          u32,
  pub pending_discovery: Option<String>,
}

/// Typeahead refresh: how many exact matches, and the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRefresh {
  pub count:       usize,
  pub first_match: Option<PersonCard>,
}

/// A person's visible contacts, with the viewer's own edge to that person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactsListing {
  pub person:   PersonRef,
  pub contact:  Option<ContactEdge>,
  pub contacts: Paginated<PersonCard>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct PeopleService<S, F> {
  store:    Arc<S>,
  remote:   RemoteResolver<S, F>,
  resolver: IdentityResolver<S, F>,
  graph:    VisibilityGraph<S>,
  composer: AggregateComposer<S>,
  sweeper:  NotificationSweeper<S>,
  settings: PeopleSettings,
}

impl<S, F> PeopleService<S, F>
where
  S: Store + 'static,
  F: FederationClient + 'static,
{
  pub fn new(
    store: Arc<S>,
    client: Arc<F>,
    settings: PeopleSettings,
    discovery: &DiscoverySettings,
  ) -> Self {
    let remote = RemoteResolver::from_settings(store.clone(), client, discovery);
    Self::with_remote(store, remote, settings)
  }

  /// Build around an already-configured [`RemoteResolver`].
  pub fn with_remote(
    store: Arc<S>,
    remote: RemoteResolver<S, F>,
    settings: PeopleSettings,
  ) -> Self {
    let graph = VisibilityGraph::new(store.clone());
    Self {
      resolver: IdentityResolver::new(store.clone(), remote.clone()),
      composer: AggregateComposer::new(
        store.clone(),
        graph.clone(),
        settings.profile_preview,
      ),
      sweeper: NotificationSweeper::new(store.clone()),
      graph,
      remote,
      store,
      settings,
    }
  }

  pub fn settings(&self) -> &PeopleSettings { &self.settings }

  pub fn remote(&self) -> &RemoteResolver<S, F> { &self.remote }

  /// Resolve a person to view. Remote persons need a signed-in viewer;
  /// that is checked before the closed-account check.
  async fn find_person(
    &self,
    lookup: &PersonLookup,
    viewer: Option<&Viewer>,
  ) -> Result<PersonRef> {
    let person = self.resolver.find(lookup).await?;
    if person.remote && viewer.is_none() {
      return Err(Error::Unauthenticated);
    }
    ensure_open(person)
  }

  /// Guid-addressed lookup for the contact routes. Closed accounts are
  /// not viewable here either.
  async fn find_by_guid(&self, guid: &str) -> Result<PersonRef> {
    let person = self
      .store
      .find_by_guid(guid)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("person {guid}")))?;
    ensure_open(person)
  }

  // ─── Search ────────────────────────────────────────────────────────────────

  /// Search for people. `limit` defaults to the configured page size;
  /// `page` is 1-based.
  pub async fn search(
    &self,
    viewer: &Viewer,
    query: &str,
    limit: Option<u32>,
    page: Option<u32>,
  ) -> Result<SearchPage> {
    let page = Page::new(
      page.unwrap_or(1),
      limit.unwrap_or(self.settings.search_page_size),
    );
    let query = SearchQuery::new(query);
    let wanted = usize::try_from(page.offset() + page.limit()).unwrap_or(usize::MAX);
    let results = self.resolver.search(&query, Some(viewer), wanted).await?;

    let pending_discovery = results.pending_discovery.clone();
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let people = results.into_iter().skip(skip).collect();

    Ok(SearchPage {
      people: self.graph.cards_for(Some(viewer), people).await?,
      page: page.number,
      per_page: page.size,
      pending_discovery,
    })
  }

  /// Re-check exact handle matches without enqueueing discovery.
  pub async fn refresh_search(
    &self,
    viewer: &Viewer,
    query: &str,
  ) -> Result<SearchRefresh> {
    let matches = self.resolver.exact_matches(&SearchQuery::new(query)).await?;
    let count = matches.len();
    let first = matches.into_iter().take(1).collect();
    let first_match = self.graph.cards_for(Some(viewer), first).await?.pop();
    Ok(SearchRefresh { count, first_match })
  }

  // ─── Profiles ──────────────────────────────────────────────────────────────

  /// Compose a profile. A signed-in view also clears the viewer's
  /// notifications about the person, in the background.
  pub async fn view_profile(
    &self,
    lookup: &PersonLookup,
    viewer: Option<&Viewer>,
  ) -> Result<ProfileAggregate> {
    let person = self.find_person(lookup, viewer).await?;
    debug!(handle = %person.handle, signed_in = viewer.is_some(), "viewing profile");
    if let Some(viewer) = viewer {
      self.sweeper.spawn_sweep(viewer.person_id(), person.person_id);
    }
    Ok(self.composer.compose_profile(viewer, person).await)
  }

  /// The person plus the viewer's edge to them.
  pub async fn hovercard(
    &self,
    lookup: &PersonLookup,
    viewer: &Viewer,
  ) -> Result<PersonCard> {
    let person = self.find_person(lookup, Some(viewer)).await?;
    let contact = self.graph.contact_for(viewer, &person).await?;
    Ok(PersonCard { person, contact })
  }

  pub async fn stream(
    &self,
    lookup: &PersonLookup,
    viewer: Option<&Viewer>,
    max_time: Option<DateTime<Utc>>,
    limit: Option<u32>,
  ) -> Result<Vec<Post>> {
    let person = self.find_person(lookup, viewer).await?;
    let limit = limit.unwrap_or(self.settings.stream_page_size) as usize;
    self.composer.stream(viewer, &person, max_time, limit).await
  }

  pub async fn last_post(
    &self,
    lookup: &PersonLookup,
    viewer: Option<&Viewer>,
  ) -> Result<Post> {
    let person = self.find_person(lookup, viewer).await?;
    self.composer.last_post(viewer, &person).await
  }

  // ─── Contacts ──────────────────────────────────────────────────────────────

  /// The contacts of the person with `guid` that `viewer` may see.
  pub async fn contacts(
    &self,
    viewer: &Viewer,
    guid: &str,
    page: Option<u32>,
    limit: Option<u32>,
  ) -> Result<ContactsListing> {
    let person = self.find_by_guid(guid).await?;
    let page = Page::new(
      page.unwrap_or(1),
      limit.unwrap_or(self.settings.contacts_page_size),
    );

    let listing = self.graph.contacts_of_contact(viewer, &person, page).await?;
    let cards = self.graph.cards_for(Some(viewer), listing.items).await?;
    let contact = self.graph.contact_for(viewer, &person).await?;

    Ok(ContactsListing {
      contacts: Paginated {
        items:       cards,
        total_count: listing.total_count,
        page:        listing.page,
        per_page:    listing.per_page,
      },
      contact,
      person,
    })
  }

  pub async fn aspect_membership(
    &self,
    viewer: &Viewer,
    guid: &str,
  ) -> Result<AspectMembership> {
    let person = self.find_by_guid(guid).await?;
    self.graph.aspect_bindings(viewer, &person).await
  }

  // ─── Discovery ─────────────────────────────────────────────────────────────

  /// Ask for a remote handle to be fetched in the background.
  pub fn request_remote_discovery(&self, handle: Option<&str>) -> Result<DiscoveryRequest> {
    let handle = handle
      .map(str::trim)
      .filter(|h| !h.is_empty())
      .ok_or_else(|| Error::Validation("handle is required".to_owned()))?;
    if !is_handle_like(handle) {
      return Err(Error::Validation(format!("{handle} is not a handle")));
    }
    Ok(self.remote.request_discovery(handle, DiscoveryOrigin::Explicit))
  }
}
