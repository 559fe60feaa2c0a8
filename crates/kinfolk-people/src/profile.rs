//! Profile assembly: the person, the viewer's edge to them, and previews of
//! their visible contacts and photos.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kinfolk_core::{
  Error, Result,
  contact::{ContactEdge, PersonCard},
  media::{Photo, Post},
  page::{Page, Preview},
  person::{PersonRef, Viewer},
  store::{ContactStore, PhotoStore, PostStore},
};
use serde::Serialize;
use tracing::warn;

use crate::visibility::VisibilityGraph;

/// Everything a profile page shows about one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileAggregate {
  pub person:   PersonRef,
  /// The viewer's edge to the person.
  pub contact:  Option<ContactEdge>,
  pub contacts: Preview<PersonCard>,
  pub photos:   Preview<Photo>,
}

pub struct AggregateComposer<S> {
  store:        Arc<S>,
  graph:        VisibilityGraph<S>,
  preview_size: u32,
}

impl<S> AggregateComposer<S>
where
  S: ContactStore + PhotoStore + PostStore,
{
  pub fn new(store: Arc<S>, graph: VisibilityGraph<S>, preview_size: u32) -> Self {
    Self { store, graph, preview_size }
  }

  /// Build the profile of `person` as seen by `viewer`.
  ///
  /// Sub-fetch failures are logged and leave that part empty; they never
  /// fail the view.
  pub async fn compose_profile(
    &self,
    viewer: Option<&Viewer>,
    person: PersonRef,
  ) -> ProfileAggregate {
    let (contact, contacts, photos) = tokio::join!(
      self.contact(viewer, &person),
      self.contacts_preview(viewer, &person),
      self.photos_preview(viewer, &person),
    );

    ProfileAggregate {
      contact:  degrade(contact, "contact edge", &person),
      contacts: degrade(contacts, "contacts preview", &person),
      photos:   degrade(photos, "photos preview", &person),
      person,
    }
  }

  async fn contact(
    &self,
    viewer: Option<&Viewer>,
    person: &PersonRef,
  ) -> Result<Option<ContactEdge>> {
    match viewer {
      Some(viewer) => self.graph.contact_for(viewer, person).await,
      None => Ok(None),
    }
  }

  async fn contacts_preview(
    &self,
    viewer: Option<&Viewer>,
    person: &PersonRef,
  ) -> Result<Preview<PersonCard>> {
    let Some(viewer) = viewer else {
      return Ok(Preview::default());
    };
    let listing = self
      .graph
      .contacts_of_contact(viewer, person, Page::first(self.preview_size))
      .await?;
    let items = self.graph.cards_for(Some(viewer), listing.items).await?;
    Ok(Preview { count: listing.total_count, items })
  }

  async fn photos_preview(
    &self,
    viewer: Option<&Viewer>,
    person: &PersonRef,
  ) -> Result<Preview<Photo>> {
    let viewer_id = viewer.map(Viewer::person_id);
    let page = Page::first(self.preview_size);
    let (items, count) = tokio::join!(
      self.store.photos_for(person.person_id, viewer_id, page),
      self.store.count_photos_for(person.person_id, viewer_id),
    );
    Ok(Preview {
      count: count.map_err(Error::store)?,
      items: items.map_err(Error::store)?,
    })
  }

  /// Posts by `person` visible to `viewer`, created before `max_time`,
  /// newest first.
  pub async fn stream(
    &self,
    viewer: Option<&Viewer>,
    person: &PersonRef,
    max_time: Option<DateTime<Utc>>,
    limit: usize,
  ) -> Result<Vec<Post>> {
    self
      .store
      .visible_posts_for(person.person_id, viewer.map(Viewer::person_id), max_time, limit)
      .await
      .map_err(Error::store)
  }

  /// The newest post by `person` visible to `viewer`.
  pub async fn last_post(
    &self,
    viewer: Option<&Viewer>,
    person: &PersonRef,
  ) -> Result<Post> {
    self
      .stream(viewer, person, None, 1)
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| Error::NotFound(format!("no visible posts by {}", person.handle)))
  }
}

fn degrade<T: Default>(result: Result<T>, part: &str, person: &PersonRef) -> T {
  result.unwrap_or_else(|e| {
    warn!(handle = %person.handle, part, error = %e, "profile part unavailable");
    T::default()
  })
}
